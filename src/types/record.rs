//! The replica record: a theme bundle plus the sync stamp the replication
//! loop attaches on every pull.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ThemeBundle;

/// Key the record is stored under in the extension's local file.
pub const REPLICA_KEY: &str = "tintThemeData";

/// A replicated bundle with provenance.
///
/// `synced_at`, `sync_count` and `sync_nonce` always change together, so a
/// fresh pull is observable even when the theme data itself is identical to
/// the previous pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaRecord {
    #[serde(flatten)]
    pub bundle: ThemeBundle,
    pub synced_at: DateTime<Utc>,
    pub sync_count: u64,
    pub sync_nonce: String,
}

impl ReplicaRecord {
    /// Stamp a freshly pulled bundle.
    pub fn stamp(bundle: ThemeBundle, sync_count: u64) -> Self {
        Self {
            bundle,
            synced_at: Utc::now(),
            sync_count,
            sync_nonce: Uuid::new_v4().to_string(),
        }
    }

    /// Time elapsed since this record was stamped.
    pub fn age(&self) -> Duration {
        Utc::now() - self.synced_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_flattens_bundle_fields_beside_the_stamp() {
        let record = ReplicaRecord::stamp(ThemeBundle::default(), 7);
        let out = serde_json::to_value(&record).unwrap();
        assert!(out.get("globalTheme").is_some());
        assert_eq!(out["syncCount"], 7);
        assert!(out["syncNonce"].as_str().is_some_and(|n| !n.is_empty()));
        assert!(out.get("bundle").is_none());
    }

    #[test]
    fn consecutive_stamps_differ_even_for_identical_bundles() {
        let a = ReplicaRecord::stamp(ThemeBundle::default(), 1);
        let b = ReplicaRecord::stamp(ThemeBundle::default(), 2);
        assert_eq!(a.bundle, b.bundle);
        assert_ne!(a.sync_count, b.sync_count);
        assert_ne!(a.sync_nonce, b.sync_nonce);
    }

    #[test]
    fn record_parses_from_wire_shape() {
        let record: ReplicaRecord = serde_json::from_value(json!({
            "globalTheme": {"enabled": true, "background": "#101010"},
            "syncedAt": "2026-08-25T12:00:00Z",
            "syncCount": 41,
            "syncNonce": "b2c1"
        }))
        .unwrap();
        assert!(record.bundle.global_theme.enabled);
        assert_eq!(record.sync_count, 41);
        assert!(record.age().num_seconds() >= 0);
    }
}
