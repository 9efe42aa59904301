//! The theme bundle: the complete document stored under the shared
//! namespace and exchanged over the bridge.
//!
//! The bundle is the unit of replication. Nothing in this crate merges at
//! field granularity; editors write whole bundles and readers replace whole
//! bundles. Accessors that key by hostname normalize the host with
//! [`crate::hostname::normalize`] on both write and read so the two can
//! never disagree about which entry a URL maps to.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::ColorHex;
use crate::hostname;
use crate::theme;

// ----------------------------------------------------------------------------
// Background

/// How a theme paints its background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BackgroundKind {
    #[default]
    Color,
    Gradient,
}

impl<'de> Deserialize<'de> for BackgroundKind {
    // Unknown or non-string kinds degrade to `Color` instead of failing the
    // whole document.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some("gradient") => BackgroundKind::Gradient,
            _ => BackgroundKind::Color,
        })
    }
}

/// A two-stop linear gradient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundGradient {
    pub from: ColorHex,
    pub to: ColorHex,
    #[serde(default = "default_gradient_angle")]
    pub angle_degrees: u16,
}

fn default_gradient_angle() -> u16 {
    180
}

// ----------------------------------------------------------------------------
// Page and keyboard themes

/// Theme applied to web pages, either globally or for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTheme {
    #[serde(default, deserialize_with = "field_de::enabled")]
    pub enabled: bool,
    #[serde(
        default = "theme::default_background",
        deserialize_with = "field_de::background"
    )]
    pub background: ColorHex,
    #[serde(default = "theme::default_text", deserialize_with = "field_de::text")]
    pub text: ColorHex,
    #[serde(default = "theme::default_link", deserialize_with = "field_de::link")]
    pub link: ColorHex,
    #[serde(default, deserialize_with = "field_de::background_kind")]
    pub background_type: BackgroundKind,
    #[serde(default, deserialize_with = "field_de::gradient")]
    pub background_gradient: Option<BackgroundGradient>,
    #[serde(default, deserialize_with = "field_de::opt_string")]
    pub preset_id: Option<String>,
}

impl Default for PageTheme {
    fn default() -> Self {
        Self {
            enabled: false,
            background: theme::default_background(),
            text: theme::default_text(),
            link: theme::default_link(),
            background_type: BackgroundKind::Color,
            background_gradient: None,
            preset_id: None,
        }
    }
}

/// Theme applied to the keyboard surface, globally or per application.
///
/// Same shape as [`PageTheme`] plus the key cap color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardTheme {
    #[serde(default, deserialize_with = "field_de::enabled")]
    pub enabled: bool,
    #[serde(
        default = "theme::default_background",
        deserialize_with = "field_de::background"
    )]
    pub background: ColorHex,
    #[serde(default = "theme::default_text", deserialize_with = "field_de::text")]
    pub text: ColorHex,
    #[serde(default = "theme::default_link", deserialize_with = "field_de::link")]
    pub link: ColorHex,
    #[serde(
        default = "theme::default_key_color",
        deserialize_with = "field_de::key_color"
    )]
    pub key_color: ColorHex,
    #[serde(default, deserialize_with = "field_de::background_kind")]
    pub background_type: BackgroundKind,
    #[serde(default, deserialize_with = "field_de::gradient")]
    pub background_gradient: Option<BackgroundGradient>,
    #[serde(default, deserialize_with = "field_de::opt_string")]
    pub preset_id: Option<String>,
}

impl Default for KeyboardTheme {
    fn default() -> Self {
        Self {
            enabled: false,
            background: theme::default_background(),
            text: theme::default_text(),
            link: theme::default_link(),
            key_color: theme::default_key_color(),
            background_type: BackgroundKind::Color,
            background_gradient: None,
            preset_id: None,
        }
    }
}

// ----------------------------------------------------------------------------
// Bundle

/// Everything the theming app persists under the shared namespace.
///
/// Every field tolerates being absent, so a bundle written by an older build
/// (or an empty `{}`) deserializes to first-launch defaults instead of
/// failing. Fields this crate does not interpret (favorites, recents,
/// presets authored in the editor) ride along as raw JSON so a replace-write
/// from a process that only edits themes cannot drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeBundle {
    #[serde(default)]
    pub global_theme: PageTheme,
    #[serde(default)]
    pub keyboard_theme: KeyboardTheme,
    #[serde(default)]
    pub site_themes: IndexMap<String, PageTheme>,
    #[serde(default)]
    pub app_themes: IndexMap<String, KeyboardTheme>,
    #[serde(default)]
    pub favorite_themes: Vec<Value>,
    #[serde(default)]
    pub recently_used_themes: Vec<Value>,
    #[serde(default)]
    pub aura_presets: Vec<Value>,
    #[serde(default)]
    pub custom_themes: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_mode_settings: Option<Value>,
    #[serde(default, deserialize_with = "field_de::opt_color")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_theme_color: Option<ColorHex>,
}

impl ThemeBundle {
    /// Look up the per-site override for a raw URL or hostname.
    pub fn site_theme(&self, raw_host: &str) -> Option<&PageTheme> {
        self.site_themes.get(&hostname::normalize(raw_host))
    }

    /// Insert or replace the per-site override for a raw URL or hostname.
    pub fn set_site_theme(&mut self, raw_host: &str, theme: PageTheme) {
        self.site_themes.insert(hostname::normalize(raw_host), theme);
    }

    /// Remove the per-site override for a raw URL or hostname.
    pub fn remove_site_theme(&mut self, raw_host: &str) -> Option<PageTheme> {
        self.site_themes.shift_remove(&hostname::normalize(raw_host))
    }

    /// Look up the per-application keyboard override.
    ///
    /// Application identifiers are opaque (bundle ids); no normalization.
    pub fn app_theme(&self, app_id: &str) -> Option<&KeyboardTheme> {
        self.app_themes.get(app_id)
    }

    pub fn set_app_theme(&mut self, app_id: impl Into<String>, theme: KeyboardTheme) {
        self.app_themes.insert(app_id.into(), theme);
    }

    pub fn remove_app_theme(&mut self, app_id: &str) -> Option<KeyboardTheme> {
        self.app_themes.shift_remove(app_id)
    }
}

// ----------------------------------------------------------------------------
// Lenient field deserializers

/// Per-field deserializers that swallow malformed values.
///
/// A bundle written by another build of the app must never be rejected
/// wholesale because one field is the wrong shape; the field falls back to
/// its documented default and the rest of the document survives.
mod field_de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{BackgroundGradient, BackgroundKind};
    use crate::color::ColorHex;
    use crate::theme;

    fn color_or<'de, D>(deserializer: D, fallback: ColorHex) -> Result<ColorHex, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .and_then(|s| s.parse::<ColorHex>().ok())
            .unwrap_or(fallback))
    }

    pub fn background<'de, D>(deserializer: D) -> Result<ColorHex, D::Error>
    where
        D: Deserializer<'de>,
    {
        color_or(deserializer, theme::default_background())
    }

    pub fn text<'de, D>(deserializer: D) -> Result<ColorHex, D::Error>
    where
        D: Deserializer<'de>,
    {
        color_or(deserializer, theme::default_text())
    }

    pub fn link<'de, D>(deserializer: D) -> Result<ColorHex, D::Error>
    where
        D: Deserializer<'de>,
    {
        color_or(deserializer, theme::default_link())
    }

    pub fn key_color<'de, D>(deserializer: D) -> Result<ColorHex, D::Error>
    where
        D: Deserializer<'de>,
    {
        color_or(deserializer, theme::default_key_color())
    }

    pub fn opt_color<'de, D>(deserializer: D) -> Result<Option<ColorHex>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().and_then(|s| s.parse::<ColorHex>().ok()))
    }

    pub fn enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub fn background_kind<'de, D>(deserializer: D) -> Result<BackgroundKind, D::Error>
    where
        D: Deserializer<'de>,
    {
        BackgroundKind::deserialize(deserializer)
    }

    pub fn gradient<'de, D>(deserializer: D) -> Result<Option<BackgroundGradient>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).ok())
    }

    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map(str::to_owned))
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_is_first_launch_bundle() {
        let bundle: ThemeBundle = serde_json::from_value(json!({})).unwrap();
        assert_eq!(bundle, ThemeBundle::default());
        assert!(!bundle.global_theme.enabled);
    }

    #[test]
    fn malformed_fields_fall_back_without_failing_the_document() {
        let bundle: ThemeBundle = serde_json::from_value(json!({
            "globalTheme": {
                "enabled": "yes",
                "background": 42,
                "text": "#112233",
                "link": "not-a-color",
                "backgroundType": "plaid",
                "backgroundGradient": "sideways"
            }
        }))
        .unwrap();
        let global = &bundle.global_theme;
        assert!(!global.enabled);
        assert_eq!(global.background, theme::default_background());
        assert_eq!(global.text.to_string(), "#112233");
        assert_eq!(global.link, theme::default_link());
        assert_eq!(global.background_type, BackgroundKind::Color);
        assert!(global.background_gradient.is_none());
    }

    #[test]
    fn multibyte_junk_in_color_fields_falls_back() {
        // Byte lengths of 6 and 3 with non-ASCII content, the shapes the
        // hex parser length-matches on.
        let bundle: ThemeBundle = serde_json::from_value(json!({
            "globalTheme": {"enabled": true, "background": "#€€", "link": "#€"},
            "keyboardTheme": {"keyColor": "#ééé"}
        }))
        .unwrap();
        assert!(bundle.global_theme.enabled);
        assert_eq!(bundle.global_theme.background, theme::default_background());
        assert_eq!(bundle.global_theme.link, theme::default_link());
        assert_eq!(bundle.keyboard_theme.key_color, theme::default_key_color());
    }

    #[test]
    fn unknown_sections_survive_a_round_trip() {
        let bundle: ThemeBundle = serde_json::from_value(json!({
            "favoriteThemes": [{"id": "dusk", "stars": 3}],
            "customThemes": [{"id": "mine"}]
        }))
        .unwrap();
        let out = serde_json::to_value(&bundle).unwrap();
        assert_eq!(out["favoriteThemes"][0]["stars"], 3);
        assert_eq!(out["customThemes"][0]["id"], "mine");
    }

    #[test]
    fn site_accessors_normalize_hostnames() {
        let mut bundle = ThemeBundle::default();
        let mut dark = PageTheme::default();
        dark.enabled = true;
        bundle.set_site_theme("HTTPS://Example.com/path?q=1", dark.clone());

        assert_eq!(bundle.site_themes.len(), 1);
        assert!(bundle.site_themes.contains_key("example.com"));
        assert_eq!(bundle.site_theme("http://example.com./"), Some(&dark));
        assert!(bundle.remove_site_theme("example.com:443").is_some());
        assert!(bundle.site_themes.is_empty());
    }

    #[test]
    fn gradient_round_trips_with_camel_case_keys() {
        let theme: PageTheme = serde_json::from_value(json!({
            "enabled": true,
            "backgroundType": "gradient",
            "backgroundGradient": {"from": "#000000", "to": "#222244", "angleDegrees": 90}
        }))
        .unwrap();
        assert_eq!(theme.background_type, BackgroundKind::Gradient);
        let gradient = theme.background_gradient.as_ref().unwrap();
        assert_eq!(gradient.angle_degrees, 90);

        let out = serde_json::to_value(&theme).unwrap();
        assert_eq!(out["backgroundType"], "gradient");
        assert_eq!(out["backgroundGradient"]["angleDegrees"], 90);
    }
}
