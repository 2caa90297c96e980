//! Theme and color model.
//!
//! # Responsibility
//! - Convert between stored hex strings and in-memory colors.
//! - Define the built-in themes and the mapping from theme colors to the
//!   roles consumed by live UI elements.
//!
//! # Invariants
//! - Colors are stored as lowercase `#rrggbb`.
//! - `Color -> hex -> Color` and `hex -> Color -> hex` are lossless for
//!   every 8-bit channel value.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid hex regex")
});

/// Name of the built-in dark theme.
pub const DARK_THEME: &str = "Dark";
/// Name of the built-in light theme.
pub const LIGHT_THEME: &str = "Light";
/// Name of the seeded theme users may delete.
pub const TROPICAL_THEME: &str = "Tropical";
/// Name reported for the in-memory fallback theme.
pub const FALLBACK_THEME: &str = "Default";

/// Error for malformed color input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColor(pub String);

impl Display for InvalidColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid hex color `{}`", self.0)
    }
}

impl std::error::Error for InvalidColor {}

/// Opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`; the leading `#` is optional
    /// and alpha is ignored.
    pub fn from_hex(value: &str) -> Result<Self, InvalidColor> {
        let trimmed = value.trim();
        if !HEX_COLOR_RE.is_match(trimmed) {
            return Err(InvalidColor(value.to_string()));
        }
        let digits = trimmed.trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| InvalidColor(value.to_string()))
        };

        if digits.len() == 3 {
            // #abc expands to #aabbcc
            return Ok(Self::rgb(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
            ));
        }
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Builds a color from normalized `[r, g, b, a]` channels in `0.0..=1.0`.
    ///
    /// Channels are rounded to the nearest 8-bit value, so values produced
    /// by [`Color::to_rgba`] map back to the same color.
    pub fn from_rgba(rgba: [f32; 4]) -> Self {
        let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(channel(rgba[0]), channel(rgba[1]), channel(rgba[2]))
    }

    /// Normalized channels with full opacity.
    pub fn to_rgba(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            1.0,
        ]
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Color::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

/// Named set of four colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub background: Color,
    pub primary: Color,
    pub secondary: Color,
    pub text: Color,
}

/// Colors assigned to each kind of themed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeRoles {
    pub window_background: Color,
    pub border: Color,
    pub divider: Color,
    pub button: Color,
    pub button_hover: Color,
    pub button_text: Color,
    pub label_text: Color,
}

impl Theme {
    pub fn new(
        name: impl Into<String>,
        background: Color,
        primary: Color,
        secondary: Color,
        text: Color,
    ) -> Self {
        Self {
            name: name.into(),
            background,
            primary,
            secondary,
            text,
        }
    }

    pub fn dark() -> Self {
        Self::new(
            DARK_THEME,
            Color::rgb(0x34, 0x35, 0x36),
            Color::rgb(0x3d, 0x0f, 0x59),
            Color::rgb(0x16, 0x9d, 0xa6),
            Color::WHITE,
        )
    }

    pub fn light() -> Self {
        Self::new(
            LIGHT_THEME,
            Color::rgb(0xe8, 0xe6, 0xdf),
            Color::rgb(0x41, 0x96, 0x62),
            Color::rgb(0x2d, 0x2d, 0x3b),
            Color::BLACK,
        )
    }

    pub fn tropical() -> Self {
        Self::new(
            TROPICAL_THEME,
            Color::rgb(0xff, 0xe8, 0xb0),
            Color::rgb(0xff, 0xa0, 0x7a),
            Color::rgb(0x20, 0xb2, 0xaa),
            Color::BLACK,
        )
    }

    /// Theme used when nothing has been selected yet.
    pub fn fallback() -> Self {
        Self::new(
            FALLBACK_THEME,
            Color::rgb(0x33, 0x33, 0x33),
            Color::rgb(0x4d, 0x4d, 0xb3),
            Color::rgb(0xb3, 0x4d, 0x4d),
            Color::WHITE,
        )
    }

    /// Dark and Light are permanent.
    pub fn is_protected(&self) -> bool {
        is_protected_theme(&self.name)
    }

    pub fn roles(&self) -> ThemeRoles {
        ThemeRoles {
            window_background: self.background,
            border: self.secondary,
            divider: self.secondary,
            button: self.primary,
            button_hover: self.secondary,
            button_text: self.text,
            label_text: self.text,
        }
    }
}

/// Built-in themes offered on first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    Dark,
    Light,
}

impl BuiltinTheme {
    pub fn theme(self) -> Theme {
        match self {
            Self::Dark => Theme::dark(),
            Self::Light => Theme::light(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case(DARK_THEME) {
            Some(Self::Dark)
        } else if name.eq_ignore_ascii_case(LIGHT_THEME) {
            Some(Self::Light)
        } else {
            None
        }
    }
}

/// Dark and Light in any letter case.
pub fn is_protected_theme(name: &str) -> bool {
    BuiltinTheme::from_name(name.trim()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_long_and_alpha_forms() {
        assert_eq!(Color::from_hex("#fff"), Ok(Color::WHITE));
        assert_eq!(Color::from_hex("20B2AA"), Ok(Color::rgb(0x20, 0xb2, 0xaa)));
        assert_eq!(Color::from_hex("#1e1e2eff"), Ok(Color::rgb(30, 30, 46)));
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn hex_round_trips_for_every_channel_value() {
        for value in 0..=255u8 {
            let color = Color::rgb(value, 255 - value, value / 2);
            let hex = color.to_hex();
            assert_eq!(Color::from_hex(&hex), Ok(color));
            assert_eq!(Color::from_hex(&hex).unwrap().to_hex(), hex);
        }
    }

    #[test]
    fn normalized_channels_round_trip_for_every_channel_value() {
        for value in 0..=255u8 {
            let color = Color::rgb(value, value, 255 - value);
            assert_eq!(Color::from_rgba(color.to_rgba()), color);
        }
    }

    #[test]
    fn float_channels_round_to_nearest() {
        // 0.204 * 255 = 52.02, 0.616 * 255 = 157.08
        let color = Color::from_rgba([0.204, 0.616, 1.5, 1.0]);
        assert_eq!(color, Color::rgb(52, 157, 255));
    }

    #[test]
    fn roles_follow_theme_colors() {
        let theme = Theme::tropical();
        let roles = theme.roles();
        assert_eq!(roles.window_background, theme.background);
        assert_eq!(roles.button, theme.primary);
        assert_eq!(roles.button_hover, theme.secondary);
        assert_eq!(roles.border, theme.secondary);
        assert_eq!(roles.label_text, theme.text);
    }

    #[test]
    fn only_dark_and_light_are_protected() {
        assert!(Theme::dark().is_protected());
        assert!(Theme::light().is_protected());
        assert!(!Theme::tropical().is_protected());
        assert_eq!(BuiltinTheme::from_name("dark"), Some(BuiltinTheme::Dark));
        assert_eq!(BuiltinTheme::from_name("Tropical"), None);
    }

    #[test]
    fn protection_ignores_letter_case() {
        assert!(is_protected_theme("dark"));
        assert!(is_protected_theme(" LIGHT "));
        assert!(!is_protected_theme("Darker"));
    }
}
