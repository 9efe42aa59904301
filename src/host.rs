//! Host-side editing of the shared bundle.
//!
//! Every mutation is read-modify-write of the whole document: load the
//! current bundle (or defaults on first launch), apply one edit, write the
//! bundle back. Sections the edit did not touch ride along unchanged.
//! Nothing else in the crate writes to the store; the bridge, the replica
//! and page consumers are read-only by construction.

use tracing::info;

use crate::presets::Preset;
use crate::store::{ConfigStore, StoreError};
use crate::types::{KeyboardTheme, PageTheme, ThemeBundle};

/// Editing facade the host app and the CLI mutate themes through.
#[derive(Debug, Clone)]
pub struct HostEditor<S> {
    store: S,
}

impl<S: ConfigStore> HostEditor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current bundle, or first-launch defaults when no document exists.
    pub async fn current(&self) -> Result<ThemeBundle, StoreError> {
        Ok(self.store.read().await?.unwrap_or_default())
    }

    /// Write the first-launch bundle if the store has no document yet.
    /// Returns the bundle the store holds afterwards.
    pub async fn ensure_initialized(&self) -> Result<ThemeBundle, StoreError> {
        if let Some(bundle) = self.store.read().await? {
            return Ok(bundle);
        }
        let bundle = ThemeBundle::default();
        self.store.write(&bundle).await?;
        info!("wrote first-launch theme bundle");
        Ok(bundle)
    }

    /// Read-modify-write one edit. Returns the bundle as written.
    pub async fn update<F>(&self, edit: F) -> Result<ThemeBundle, StoreError>
    where
        F: FnOnce(&mut ThemeBundle),
    {
        let mut bundle = self.current().await?;
        edit(&mut bundle);
        self.store.write(&bundle).await?;
        Ok(bundle)
    }

    pub async fn set_global_theme(&self, theme: PageTheme) -> Result<ThemeBundle, StoreError> {
        info!(enabled = theme.enabled, "setting global page theme");
        self.update(|bundle| bundle.global_theme = theme).await
    }

    pub async fn set_keyboard_theme(&self, theme: KeyboardTheme) -> Result<ThemeBundle, StoreError> {
        info!(enabled = theme.enabled, "setting global keyboard theme");
        self.update(|bundle| bundle.keyboard_theme = theme).await
    }

    pub async fn set_site_override(
        &self,
        raw_host: &str,
        theme: PageTheme,
    ) -> Result<ThemeBundle, StoreError> {
        info!(host = raw_host, "setting site override");
        self.update(|bundle| bundle.set_site_theme(raw_host, theme))
            .await
    }

    /// Remove a site override. `Ok(false)` when no override existed.
    pub async fn remove_site_override(&self, raw_host: &str) -> Result<bool, StoreError> {
        let mut removed = false;
        self.update(|bundle| removed = bundle.remove_site_theme(raw_host).is_some())
            .await?;
        info!(host = raw_host, removed, "removed site override");
        Ok(removed)
    }

    pub async fn set_app_override(
        &self,
        app_id: &str,
        theme: KeyboardTheme,
    ) -> Result<ThemeBundle, StoreError> {
        info!(app = app_id, "setting app keyboard override");
        self.update(|bundle| bundle.set_app_theme(app_id, theme))
            .await
    }

    pub async fn remove_app_override(&self, app_id: &str) -> Result<bool, StoreError> {
        let mut removed = false;
        self.update(|bundle| removed = bundle.remove_app_theme(app_id).is_some())
            .await?;
        info!(app = app_id, removed, "removed app keyboard override");
        Ok(removed)
    }

    /// Apply a preset to both global surfaces at once.
    pub async fn apply_preset(&self, preset: &Preset) -> Result<ThemeBundle, StoreError> {
        info!(preset = preset.id, "applying preset globally");
        self.update(|bundle| {
            bundle.global_theme = preset.page.clone();
            bundle.keyboard_theme = preset.keyboard.clone();
        })
        .await
    }
}
