use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::store::SHARED_NAMESPACE;
use crate::sync::SyncPolicy;

// ---------------------------------------------------------------------------
// Top-level settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub sync: SyncSection,
    pub store: StoreSection,
    pub replica: ReplicaSection,
}

impl SyncSettings {
    /// Timing knobs as the replication loop consumes them.
    pub fn policy(&self) -> SyncPolicy {
        SyncPolicy {
            poll_interval: Duration::from_millis(self.sync.poll_interval_ms),
            bridge_timeout: Duration::from_millis(self.sync.bridge_timeout_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub poll_interval_ms: u64,
    pub bridge_timeout_ms: u64,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            bridge_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Root of the shared container. Platform data dir when unset.
    pub root: Option<PathBuf>,
    pub namespace: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            root: None,
            namespace: SHARED_NAMESPACE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReplicaSection {
    /// Directory holding the replica cache file. Platform data dir when
    /// unset.
    pub dir: Option<PathBuf>,
}
