//! RGBA colors and the color string grammar.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A straight (non premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color string '{0}'")]
pub struct ParseColorError(pub String);

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "red" => Color::rgb(255, 0, 0),
            "green" => Color::rgb(0, 255, 0),
            "blue" => Color::rgb(0, 0, 255),
            "yellow" => Color::rgb(255, 255, 0),
            "orange" => Color::rgb(255, 165, 0),
            "purple" => Color::rgb(128, 0, 128),
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "transparent" => Color::TRANSPARENT,
            _ => return None,
        };
        Some(color)
    }

    /// Parses `#RGB`, `#ARGB`, `#RRGGBB` or `#AARRGGBB` (without the `#`).
    fn from_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let doubled = || hex.chars().flat_map(|c| [c, c]).collect::<String>();
        let expanded = match hex.len() {
            3 => format!("ff{}", doubled()),
            4 => doubled(),
            6 => format!("ff{}", hex),
            8 => hex.to_string(),
            _ => return None,
        };
        let packed = u32::from_str_radix(&expanded, 16).ok()?;
        let [a, r, g, b] = packed.to_be_bytes();
        Some(Color::rgba(r, g, b, a))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Color names are case insensitive and surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let color = match normalized.strip_prefix('#') {
            Some(hex) => Color::from_hex(hex),
            None => Color::named(&normalized),
        };
        color.ok_or_else(|| ParseColorError(s.to_string()))
    }
}

/// `#RRGGBB` for opaque colors, `#AARRGGBB` otherwise.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
        }
    }
}
