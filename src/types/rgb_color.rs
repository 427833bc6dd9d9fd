// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color type with HTML/name parsing and per-channel levels.
//!
//! A color device drives three independent channels. [`RgbColor`] is the
//! bridge between the color literals clients send (`#ff8800`, `orange`)
//! and the three channel levels (0-100) the fade scheduler works with.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

use super::Level;

/// RGB color with 8-bit channels (0-255).
///
/// # Examples
///
/// ```
/// use ledctl_lib::types::RgbColor;
///
/// let color: RgbColor = "#FF8000".parse().unwrap();
/// assert_eq!(color.to_html(), "#ff8000");
///
/// let named: RgbColor = "red".parse().unwrap();
/// assert_eq!(named, RgbColor::new(255, 0, 0));
///
/// // Lightness is the HSL lightness of the color
/// assert!((RgbColor::new(255, 0, 0).lightness() - 0.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses a color literal.
    ///
    /// Accepts `#RRGGBB`, `RRGGBB`, `#RGB`, `RGB` and CSS color names, all
    /// case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidColor` if the literal is not recognized.
    pub fn parse(literal: &str) -> Result<Self, ValueError> {
        let trimmed = literal.trim();
        let lower = trimmed.to_lowercase();

        if let Some(color) = named_color(&lower) {
            return Ok(color);
        }

        Self::from_hex(&lower).map_err(|_| ValueError::InvalidColor(literal.to_string()))
    }

    /// Parses an RGB color from a hex string.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidColor` if the hex string is invalid.
    pub fn from_hex(hex: &str) -> Result<Self, ValueError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValueError::InvalidColor(hex.to_string()));
        }

        match digits.len() {
            3 => {
                let mut parts = digits.chars().map(parse_hex_char);
                let (Some(r), Some(g), Some(b)) = (parts.next(), parts.next(), parts.next()) else {
                    return Err(ValueError::InvalidColor(hex.to_string()));
                };
                // Expand 0-F to 0-255
                Ok(Self::new(r? * 17, g? * 17, b? * 17))
            }
            6 => {
                let r = parse_hex_pair(&digits[0..2])?;
                let g = parse_hex_pair(&digits[2..4])?;
                let b = parse_hex_pair(&digits[4..6])?;
                Ok(Self::new(r, g, b))
            }
            _ => Err(ValueError::InvalidColor(hex.to_string())),
        }
    }

    /// Builds a color from three channel levels (red, green, blue).
    #[must_use]
    pub fn from_levels(levels: [Level; 3]) -> Self {
        let [r, g, b] = levels;
        Self::new(r.to_component(), g.to_component(), b.to_component())
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Returns the three components scaled to channel levels (0-100).
    #[must_use]
    pub fn levels(&self) -> [Level; 3] {
        [
            Level::from_component(self.red),
            Level::from_component(self.green),
            Level::from_component(self.blue),
        ]
    }

    /// Returns the HSL lightness in the range 0.0-1.0.
    #[must_use]
    pub fn lightness(&self) -> f64 {
        let max = self.red.max(self.green).max(self.blue);
        let min = self.red.min(self.green).min(self.blue);
        (f64::from(max) + f64::from(min)) / (2.0 * 255.0)
    }

    /// Returns the lightness as a level (0-100).
    #[must_use]
    pub fn lightness_level(&self) -> Level {
        Level::clamped(self.lightness() * 100.0)
    }

    /// Returns `true` if any channel is lit.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.red > 0 || self.green > 0 || self.blue > 0
    }

    /// Returns the color as a lowercase HTML string (`#rrggbb`).
    #[must_use]
    pub fn to_html(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Creates a white color.
    #[must_use]
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Creates a black color.
    #[must_use]
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

impl FromStr for RgbColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

fn parse_hex_char(c: char) -> Result<u8, ValueError> {
    c.to_digit(16)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or_else(|| ValueError::InvalidColor(c.to_string()))
}

fn parse_hex_pair(s: &str) -> Result<u8, ValueError> {
    u8::from_str_radix(s, 16).map_err(|_| ValueError::InvalidColor(s.to_string()))
}

/// Looks up a CSS color name.
fn named_color(name: &str) -> Option<RgbColor> {
    let rgb = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "lime" => (0, 255, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "cyan" | "aqua" => (0, 255, 255),
        "magenta" | "fuchsia" => (255, 0, 255),
        "silver" => (192, 192, 192),
        "gray" | "grey" => (128, 128, 128),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "purple" => (128, 0, 128),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "orange" => (255, 165, 0),
        "darkorange" => (255, 140, 0),
        "gold" => (255, 215, 0),
        "pink" => (255, 192, 203),
        "hotpink" => (255, 105, 180),
        "violet" => (238, 130, 238),
        "indigo" => (75, 0, 130),
        "coral" => (255, 127, 80),
        "salmon" => (250, 128, 114),
        "tomato" => (255, 99, 71),
        "crimson" => (220, 20, 60),
        "turquoise" => (64, 224, 208),
        "skyblue" => (135, 206, 235),
        "royalblue" => (65, 105, 225),
        "chartreuse" => (127, 255, 0),
        "lavender" => (230, 230, 250),
        "beige" => (245, 245, 220),
        "ivory" => (255, 255, 240),
        "wheat" => (245, 222, 179),
        "khaki" => (240, 230, 140),
        "brown" => (165, 42, 42),
        "chocolate" => (210, 105, 30),
        "warmwhite" | "oldlace" => (253, 245, 230),
        _ => return None,
    };
    Some(RgbColor::from(rgb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_hex() {
        let color = RgbColor::parse("#FF5733").unwrap();
        assert_eq!(color, RgbColor::new(255, 87, 51));

        let color = RgbColor::parse("00ff00").unwrap();
        assert_eq!(color, RgbColor::new(0, 255, 0));
    }

    #[test]
    fn parse_short_hex() {
        assert_eq!(RgbColor::parse("#F00").unwrap(), RgbColor::new(255, 0, 0));
        assert_eq!(RgbColor::parse("0f0").unwrap(), RgbColor::new(0, 255, 0));
    }

    #[test]
    fn parse_names() {
        assert_eq!(RgbColor::parse("White").unwrap(), RgbColor::white());
        assert_eq!(RgbColor::parse(" orange ").unwrap(), RgbColor::new(255, 165, 0));
        assert_eq!(RgbColor::parse("green").unwrap(), RgbColor::new(0, 128, 0));
    }

    #[test]
    fn parse_invalid() {
        assert_eq!(
            RgbColor::parse("notacolor"),
            Err(ValueError::InvalidColor("notacolor".to_string()))
        );
        assert!(RgbColor::parse("#GG0000").is_err());
        assert!(RgbColor::parse("#FF00").is_err());
        assert!(RgbColor::parse("").is_err());
        assert!(RgbColor::parse("#ééé").is_err());
    }

    #[test]
    fn html_is_lowercase_with_hash() {
        assert_eq!(RgbColor::new(255, 128, 0).to_html(), "#ff8000");
        assert_eq!(RgbColor::new(0, 15, 255).to_string(), "#000fff");
    }

    #[test]
    fn lightness_values() {
        assert!((RgbColor::white().lightness() - 1.0).abs() < 1e-9);
        assert!(RgbColor::black().lightness().abs() < 1e-9);
        assert!((RgbColor::new(0, 0, 255).lightness() - 0.5).abs() < 1e-9);
        assert_eq!(RgbColor::new(0, 0, 255).lightness_level().rounded(), 50);
    }

    #[test]
    fn levels_roundtrip() {
        let color = RgbColor::new(255, 87, 51);
        assert_eq!(RgbColor::from_levels(color.levels()), color);
    }

    #[test]
    fn black_is_not_lit() {
        assert!(!RgbColor::black().is_lit());
        assert!(RgbColor::new(0, 0, 1).is_lit());
        assert_eq!(RgbColor::default(), RgbColor::black());
    }
}
