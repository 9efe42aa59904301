use crate::color::ColorHex;
use crate::types::{BackgroundGradient, BackgroundKind, KeyboardTheme, PageTheme, ThemeBundle};

/// Fallback colors for theme fields that are absent or malformed.
///
/// These are field-level fallbacks only. Resolution never fills a missing
/// override field from the global theme; an override shadows the global
/// theme wholesale.
pub fn default_background() -> ColorHex {
    ColorHex::rgb(0xff, 0xff, 0xff)
}

pub fn default_text() -> ColorHex {
    ColorHex::rgb(0x00, 0x00, 0x00)
}

pub fn default_link() -> ColorHex {
    ColorHex::rgb(0x00, 0x66, 0xcc)
}

pub fn default_key_color() -> ColorHex {
    ColorHex::rgb(0xe8, 0xe8, 0xe8)
}

/// Where a resolved theme came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// A per-site or per-app override keyed by the normalized identifier.
    Override,
    /// The bundle-wide global theme.
    Global,
}

/// Pick the page theme for a URL or hostname.
///
/// A site override, when present, wins entirely. That includes its
/// `enabled` flag: a disabled override does not fall through to the global
/// theme, it disables theming for that site.
pub fn resolve_page_theme<'a>(bundle: &'a ThemeBundle, raw_host: &str) -> (&'a PageTheme, MatchKind) {
    match bundle.site_theme(raw_host) {
        Some(theme) => (theme, MatchKind::Override),
        None => (&bundle.global_theme, MatchKind::Global),
    }
}

/// Like [`resolve_page_theme`], but `None` when the winning theme is
/// disabled. This is the question page rendering actually asks.
pub fn active_page_theme<'a>(
    bundle: &'a ThemeBundle,
    raw_host: &str,
) -> Option<(&'a PageTheme, MatchKind)> {
    let (theme, kind) = resolve_page_theme(bundle, raw_host);
    theme.enabled.then_some((theme, kind))
}

/// Pick the keyboard theme for an application identifier.
pub fn resolve_keyboard_theme<'a>(
    bundle: &'a ThemeBundle,
    app_id: &str,
) -> (&'a KeyboardTheme, MatchKind) {
    match bundle.app_theme(app_id) {
        Some(theme) => (theme, MatchKind::Override),
        None => (&bundle.keyboard_theme, MatchKind::Global),
    }
}

pub fn active_keyboard_theme<'a>(
    bundle: &'a ThemeBundle,
    app_id: &str,
) -> Option<(&'a KeyboardTheme, MatchKind)> {
    let (theme, kind) = resolve_keyboard_theme(bundle, app_id);
    theme.enabled.then_some((theme, kind))
}

/// The concrete background a theme paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundPaint<'a> {
    Solid(ColorHex),
    Gradient(&'a BackgroundGradient),
}

/// The background a page theme paints. A gradient type without gradient
/// stops degrades to the solid color.
pub fn page_background(theme: &PageTheme) -> BackgroundPaint<'_> {
    match (theme.background_type, theme.background_gradient.as_ref()) {
        (BackgroundKind::Gradient, Some(gradient)) => BackgroundPaint::Gradient(gradient),
        _ => BackgroundPaint::Solid(theme.background),
    }
}

pub fn keyboard_background(theme: &KeyboardTheme) -> BackgroundPaint<'_> {
    match (theme.background_type, theme.background_gradient.as_ref()) {
        (BackgroundKind::Gradient, Some(gradient)) => BackgroundPaint::Gradient(gradient),
        _ => BackgroundPaint::Solid(theme.background),
    }
}
