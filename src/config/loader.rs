use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::types::SyncSettings;

/// Discover and load the crate settings.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `$TINT_SYNC_CONFIG` environment variable
/// 3. `$XDG_CONFIG_HOME/tint-sync/config.toml`
/// 4. `~/.config/tint-sync/config.toml`
///
/// Steps 2-4 fall through when nothing is there and defaults apply. An
/// explicit path that cannot be read is an error.
pub fn load_settings(explicit_path: Option<&Path>) -> Result<SyncSettings> {
    let settings = if let Some(path) = explicit_path {
        read_settings(path)?
    } else {
        match find_settings_file() {
            Some(path) => read_settings(&path)?,
            None => SyncSettings::default(),
        }
    };
    validate(&settings)?;
    Ok(settings)
}

fn read_settings(path: &Path) -> Result<SyncSettings> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing TOML from {}", path.display()))
}

fn validate(settings: &SyncSettings) -> Result<()> {
    if settings.sync.poll_interval_ms == 0 {
        bail!("sync.poll_interval_ms must be greater than zero");
    }
    if settings.sync.bridge_timeout_ms == 0 {
        bail!("sync.bridge_timeout_ms must be greater than zero");
    }
    let namespace = &settings.store.namespace;
    if namespace.is_empty() {
        bail!("store.namespace must not be empty");
    }
    // The namespace becomes a single directory component.
    if namespace.contains(['/', '\\']) {
        bail!("store.namespace must not contain path separators: {namespace:?}");
    }
    Ok(())
}

fn find_settings_file() -> Option<PathBuf> {
    // $TINT_SYNC_CONFIG
    if let Ok(path) = std::env::var("TINT_SYNC_CONFIG") {
        let p = PathBuf::from(&path);
        if p.is_file() {
            return Some(p);
        }
    }

    // $XDG_CONFIG_HOME/tint-sync/config.toml
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let p = PathBuf::from(xdg).join("tint-sync/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // ~/.config/tint-sync/config.toml
    if let Some(home) = dirs_fallback() {
        let p = home.join(".config/tint-sync/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    None
}

fn dirs_fallback() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Directory for crate-owned data when the settings do not pin one.
fn default_data_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("tint-sync");
    }
    match dirs_fallback() {
        Some(home) => home.join(".local/share/tint-sync"),
        None => PathBuf::from(".tint-sync"),
    }
}

/// Root directory the shared store namespace lives under.
pub fn store_root(settings: &SyncSettings) -> PathBuf {
    settings
        .store
        .root
        .clone()
        .unwrap_or_else(|| default_data_dir().join("store"))
}

/// File backing the extension replica.
pub fn replica_path(settings: &SyncSettings) -> PathBuf {
    settings
        .replica
        .dir
        .clone()
        .unwrap_or_else(|| default_data_dir().join("replica"))
        .join("replica.json")
}
