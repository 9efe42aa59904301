// Shared domain types, used by the store, the bridge, the replication loop
// and the page consumer. None of those layers depend on each other; all
// import from this module.

pub mod bundle;
pub mod record;

pub use bundle::*;
pub use record::*;
