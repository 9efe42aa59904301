//! Built-in theme presets, selectable by id from the editor UI and the
//! `set-global` / `set-site` commands.

use crate::color::ColorHex;
use crate::types::{KeyboardTheme, PageTheme};

/// A named pair of page and keyboard themes that ship with the app.
#[derive(Debug, Clone)]
pub struct Preset {
    pub id: &'static str,
    pub label: &'static str,
    pub page: PageTheme,
    pub keyboard: KeyboardTheme,
}

/// Look up a preset by id.
pub fn get(id: &str) -> Option<Preset> {
    match id {
        "midnight" => Some(midnight()),
        "sepia" => Some(sepia()),
        "forest" => Some(forest()),
        "slate" => Some(slate()),
        "high-contrast" => Some(high_contrast()),
        _ => None,
    }
}

/// Ids of all built-in presets, in display order.
pub fn list() -> &'static [&'static str] {
    &["midnight", "sepia", "forest", "slate", "high-contrast"]
}

fn preset(
    id: &'static str,
    label: &'static str,
    background: ColorHex,
    text: ColorHex,
    link: ColorHex,
    key_color: ColorHex,
) -> Preset {
    Preset {
        id,
        label,
        page: PageTheme {
            enabled: true,
            background,
            text,
            link,
            preset_id: Some(id.to_owned()),
            ..PageTheme::default()
        },
        keyboard: KeyboardTheme {
            enabled: true,
            background,
            text,
            link,
            key_color,
            preset_id: Some(id.to_owned()),
            ..KeyboardTheme::default()
        },
    }
}

fn midnight() -> Preset {
    preset(
        "midnight",
        "Midnight",
        ColorHex::rgb(0x12, 0x12, 0x1a),
        ColorHex::rgb(0xd8, 0xd8, 0xe0),
        ColorHex::rgb(0x7a, 0xa2, 0xf7),
        ColorHex::rgb(0x24, 0x24, 0x30),
    )
}

fn sepia() -> Preset {
    preset(
        "sepia",
        "Sepia",
        ColorHex::rgb(0xf4, 0xec, 0xd8),
        ColorHex::rgb(0x5b, 0x46, 0x36),
        ColorHex::rgb(0x8a, 0x5a, 0x2b),
        ColorHex::rgb(0xe6, 0xda, 0xc0),
    )
}

fn forest() -> Preset {
    preset(
        "forest",
        "Forest",
        ColorHex::rgb(0x0f, 0x1a, 0x14),
        ColorHex::rgb(0xcd, 0xe3, 0xd4),
        ColorHex::rgb(0x6f, 0xc2, 0x8b),
        ColorHex::rgb(0x1c, 0x2e, 0x24),
    )
}

fn slate() -> Preset {
    preset(
        "slate",
        "Slate",
        ColorHex::rgb(0x28, 0x2c, 0x34),
        ColorHex::rgb(0xc8, 0xcc, 0xd4),
        ColorHex::rgb(0x61, 0xaf, 0xef),
        ColorHex::rgb(0x3a, 0x3f, 0x4b),
    )
}

fn high_contrast() -> Preset {
    preset(
        "high-contrast",
        "High contrast",
        ColorHex::rgb(0x00, 0x00, 0x00),
        ColorHex::rgb(0xff, 0xff, 0xff),
        ColorHex::rgb(0xff, 0xd9, 0x00),
        ColorHex::rgb(0x1a, 0x1a, 0x1a),
    )
}
