use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// An RGB color carried through the theme bundle.
///
/// The canonical wire form is `#` followed by six lowercase hex digits.
/// Parsing additionally accepts the `#RGB` shorthand (each digit doubled)
/// and uppercase input; both are canonicalized on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorHex {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Error)]
#[error("invalid color value for field \"{field}\": \"{value}\"")]
pub struct ColorParseError {
    pub field: String,
    pub value: String,
}

impl ColorHex {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a color string with a field name for error reporting.
    ///
    /// Accepts:
    /// - `"#RRGGBB"` (canonical)
    /// - `"#RGB"` shorthand, expanded digit-by-digit
    ///
    /// # Errors
    ///
    /// Returns `ColorParseError` if the string is not a valid hex color.
    pub fn parse(s: &str, field: &str) -> Result<Self, ColorParseError> {
        let make_err = || ColorParseError {
            field: field.to_owned(),
            value: s.to_owned(),
        };

        let Some(hex) = s.strip_prefix('#') else {
            return Err(make_err());
        };
        // The byte-offset slicing below requires single-byte characters;
        // multibyte input could land a slice inside a char.
        if !hex.is_ascii() {
            return Err(make_err());
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| make_err())?;
                let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| make_err())?;
                let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| make_err())?;
                Ok(Self { r, g, b })
            }
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).map_err(|_| make_err())?;
                let g = u8::from_str_radix(&hex[1..2], 16).map_err(|_| make_err())?;
                let b = u8::from_str_radix(&hex[2..3], 16).map_err(|_| make_err())?;
                Ok(Self {
                    r: r * 17,
                    g: g * 17,
                    b: b * 17,
                })
            }
            _ => Err(make_err()),
        }
    }
}

impl fmt::Display for ColorHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { r, g, b } = self;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for ColorHex {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorHex::parse(s, "<unknown>")
    }
}

impl Serialize for ColorHex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Strict deserialization: a non-color string is an error. Bundle fields
/// that must never fail the whole document use the lenient per-field
/// helpers in `types::bundle` instead.
impl<'de> Deserialize<'de> for ColorHex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ColorHex::parse(&s, "<color>").map_err(serde::de::Error::custom)
    }
}
