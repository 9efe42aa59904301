// Pedantic: suppress noise for internal crate code.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod bridge;
pub mod color;
pub mod config;
pub mod consumer;
pub mod host;
pub mod hostname;
pub mod presets;
pub mod replica;
pub mod store;
pub mod sync;
pub mod theme;
pub mod types;
pub mod util;
