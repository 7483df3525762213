use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{AnimError, AnimResult};

/// A CSS color value in straight (non-premultiplied) RGBA8.
///
/// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)` and a handful of
/// named colors. Serializes back as lowercase hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CssColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl CssColor {
    /// Opaque white (`#ffffff`).
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black (`#000000`).
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color string.
    pub fn parse(s: &str) -> AnimResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AnimError::validation("color must be non-empty"));
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            return parse_rgb_fn(args, s);
        }
        named(&lower).ok_or_else(|| AnimError::validation(format!("unknown color \"{s}\"")))
    }

    /// Straight RGBA8 bytes.
    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Premultiplied form used by the raster backend.
    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }

    pub(crate) fn to_cpu_color(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl Default for CssColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for CssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

impl FromStr for CssColor {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CssColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CssColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_hex(s: &str) -> AnimResult<CssColor> {
    fn hex_byte(pair: &str) -> AnimResult<u8> {
        u8::from_str_radix(pair, 16)
            .map_err(|_| AnimError::validation(format!("invalid hex byte \"{pair}\"")))
    }

    fn hex_nibble(c: &str) -> AnimResult<u8> {
        let v = u8::from_str_radix(c, 16)
            .map_err(|_| AnimError::validation(format!("invalid hex digit \"{c}\"")))?;
        Ok(v * 17)
    }

    if !s.is_ascii() {
        return Err(AnimError::validation("hex color must be ascii"));
    }

    match s.len() {
        3 => Ok(CssColor::rgb(
            hex_nibble(&s[0..1])?,
            hex_nibble(&s[1..2])?,
            hex_nibble(&s[2..3])?,
        )),
        6 => Ok(CssColor::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(CssColor::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        )),
        _ => Err(AnimError::validation(
            "hex color must be #RGB, #RRGGBB or #RRGGBBAA (case-insensitive)",
        )),
    }
}

fn parse_rgb_fn(args: &str, original: &str) -> AnimResult<CssColor> {
    let inner = args
        .strip_suffix(')')
        .ok_or_else(|| AnimError::validation(format!("unterminated color \"{original}\"")))?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();

    let channel = |p: &str| -> AnimResult<u8> {
        let v: f64 = p
            .parse()
            .map_err(|_| AnimError::validation(format!("invalid color channel \"{p}\"")))?;
        Ok(v.clamp(0.0, 255.0).round() as u8)
    };

    match parts.as_slice() {
        [r, g, b] => Ok(CssColor::rgb(channel(r)?, channel(g)?, channel(b)?)),
        [r, g, b, a] => {
            let a: f64 = a
                .parse()
                .map_err(|_| AnimError::validation(format!("invalid alpha \"{a}\"")))?;
            Ok(CssColor::rgba(
                channel(r)?,
                channel(g)?,
                channel(b)?,
                (a.clamp(0.0, 1.0) * 255.0).round() as u8,
            ))
        }
        _ => Err(AnimError::validation(format!(
            "rgb()/rgba() expects 3 or 4 components, got \"{original}\""
        ))),
    }
}

fn named(name: &str) -> Option<CssColor> {
    let c = match name {
        "white" => CssColor::WHITE,
        "black" => CssColor::BLACK,
        "transparent" => CssColor::rgba(0, 0, 0, 0),
        "red" => CssColor::rgb(255, 0, 0),
        "green" => CssColor::rgb(0, 128, 0),
        "lime" => CssColor::rgb(0, 255, 0),
        "blue" => CssColor::rgb(0, 0, 255),
        "yellow" => CssColor::rgb(255, 255, 0),
        "orange" => CssColor::rgb(255, 165, 0),
        "purple" => CssColor::rgb(128, 0, 128),
        "pink" => CssColor::rgb(255, 192, 203),
        "gray" | "grey" => CssColor::rgb(128, 128, 128),
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "../../tests/unit/settings/color.rs"]
mod tests;
