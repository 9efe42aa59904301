// config module: crate settings (TOML), distinct from the theme data the
// crate synchronizes

pub mod loader;
pub mod types;

pub use loader::load_settings;
pub use types::SyncSettings;
