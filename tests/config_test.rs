use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tint_sync::config::loader::{load_settings, replica_path, store_root};
use tint_sync::config::types::SyncSettings;
use tint_sync::store::SHARED_NAMESPACE;

#[test]
fn parse_minimal_settings() {
    let toml = r#"
[sync]
poll_interval_ms = 250
"#;
    let settings: SyncSettings = toml::from_str(toml).unwrap();
    assert_eq!(settings.sync.poll_interval_ms, 250);
    // Unspecified fields keep their defaults.
    assert_eq!(settings.sync.bridge_timeout_ms, 5_000);
    assert_eq!(settings.store.namespace, SHARED_NAMESPACE);
}

#[test]
fn parse_unknown_keys_ignored() {
    let toml = r#"
unknown_top_level = "should be ignored"

[sync]
bridge_timeout_ms = 1000
"#;
    let settings: SyncSettings = toml::from_str(toml).unwrap();
    assert_eq!(settings.sync.bridge_timeout_ms, 1000);
}

#[test]
fn default_settings_have_sane_defaults() {
    let settings = SyncSettings::default();
    assert_eq!(settings.sync.poll_interval_ms, 2_000);
    assert_eq!(settings.sync.bridge_timeout_ms, 5_000);
    assert_eq!(settings.store.namespace, "group.app.tint.shared");
    assert!(settings.store.root.is_none());
    assert!(settings.replica.dir.is_none());
}

#[test]
fn policy_converts_milliseconds() {
    let toml = r#"
[sync]
poll_interval_ms = 50
bridge_timeout_ms = 120
"#;
    let settings: SyncSettings = toml::from_str(toml).unwrap();
    let policy = settings.policy();
    assert_eq!(policy.poll_interval, Duration::from_millis(50));
    assert_eq!(policy.bridge_timeout, Duration::from_millis(120));
    assert_eq!(
        policy.staleness_bound(),
        chrono::Duration::milliseconds(170)
    );
}

#[test]
fn explicit_paths_win_over_defaults() {
    let toml = r#"
[store]
root = "/tmp/tint-store"
namespace = "group.app.tint.test"

[replica]
dir = "/tmp/tint-replica"
"#;
    let settings: SyncSettings = toml::from_str(toml).unwrap();
    assert_eq!(store_root(&settings), PathBuf::from("/tmp/tint-store"));
    assert_eq!(
        replica_path(&settings),
        PathBuf::from("/tmp/tint-replica/replica.json")
    );
}

// ---------------------------------------------------------------------------
// Loading from files
// ---------------------------------------------------------------------------

fn write_settings_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

#[test]
fn load_explicit_file() {
    let (_dir, path) = write_settings_file(
        r#"
[sync]
poll_interval_ms = 777
"#,
    );
    let settings = load_settings(Some(&path)).unwrap();
    assert_eq!(settings.sync.poll_interval_ms, 777);
}

#[test]
fn missing_explicit_file_produces_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_settings(Some(&dir.path().join("nonexistent.toml")));
    assert!(result.is_err());
}

#[test]
fn invalid_toml_error_mentions_the_file() {
    let (_dir, path) = write_settings_file("[sync\npoll_interval_ms = 1");
    let err = load_settings(Some(&path)).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("config.toml"), "error should mention file: {msg}");
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn zero_poll_interval_is_rejected() {
    let (_dir, path) = write_settings_file(
        r#"
[sync]
poll_interval_ms = 0
"#,
    );
    let err = load_settings(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("poll_interval_ms"));
}

#[test]
fn zero_bridge_timeout_is_rejected() {
    let (_dir, path) = write_settings_file(
        r#"
[sync]
bridge_timeout_ms = 0
"#,
    );
    let err = load_settings(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("bridge_timeout_ms"));
}

#[test]
fn empty_namespace_is_rejected() {
    let (_dir, path) = write_settings_file(
        r#"
[store]
namespace = ""
"#,
    );
    let err = load_settings(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("namespace"));
}

#[test]
fn namespace_with_path_separator_is_rejected() {
    let (_dir, path) = write_settings_file(
        r#"
[store]
namespace = "group/evil"
"#,
    );
    let err = load_settings(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("separator"));
}
