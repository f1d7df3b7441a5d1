//! Colour values and CSS-style colour strings
//!
//! Asset tables describe colours as `#rrggbb` or `rgba(...)` strings, so the
//! same notation is accepted here and used for (de)serialisation.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Straight-alpha colour: 8-bit channels plus a unit alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour with a different alpha (clamped to [0, 1])
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: clamp_unit(a), ..self }
    }

    /// Multiply the alpha by `factor`
    pub fn fade(self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    /// Linear interpolation of every channel
    pub fn mix(self, other: Color, t: f32) -> Self {
        let t = clamp_unit(t);
        let lerp = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t).round().clamp(0.0, 255.0) as u8;
        Self {
            r: lerp(self.r, other.r),
            g: lerp(self.g, other.g),
            b: lerp(self.b, other.b),
            a: self.a * (1.0 - t) + other.a * t,
        }
    }

    /// Channels as unit floats `[r, g, b, a]`
    pub fn to_unit(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            clamp_unit(self.a),
        ]
    }

    /// Parse `#rgb`, `#rrggbb`, `rgb(r,g,b)` or `rgba(r,g,b,a)`
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = s.to_ascii_lowercase();
        let (body, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest.strip_suffix(')')?, true)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest.strip_suffix(')')?, false)
        } else {
            return None;
        };

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return None;
        }

        let channel = |p: &str| -> Option<u8> {
            let v: f32 = p.parse().ok()?;
            Some(v.round().clamp(0.0, 255.0) as u8)
        };
        let a = if has_alpha {
            clamp_unit(parts[3].parse().ok()?)
        } else {
            1.0
        };

        Some(Self {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a,
        })
    }

    /// Parse, logging and substituting `fallback` on failure
    pub fn parse_or(input: &str, fallback: Color) -> Self {
        Self::parse(input).unwrap_or_else(|| {
            log::debug!("Unparseable colour {:?}, using fallback", input);
            fallback
        })
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digit = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => {
            let r = digit(bytes[0])?;
            let g = digit(bytes[1])?;
            let b = digit(bytes[2])?;
            Some(Color::rgb(r * 17, g * 17, b * 17))
        }
        6 => {
            let pair = |i: usize| Some(digit(bytes[i])? * 16 + digit(bytes[i + 1])?);
            Some(Color::rgb(pair(0)?, pair(2)?, pair(4)?))
        }
        _ => None,
    }
}

#[inline]
pub(crate) fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid colour {:?}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::parse("#05070d"), Some(Color::rgb(5, 7, 13)));
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("#12345"), None);
    }

    #[test]
    fn test_parse_rgba() {
        let c = Color::parse("rgba(255, 232, 180, 0.9)").unwrap();
        assert_eq!((c.r, c.g, c.b), (255, 232, 180));
        assert!((c.a - 0.9).abs() < 1e-6);

        assert_eq!(Color::parse("rgb(1,2,3)"), Some(Color::rgb(1, 2, 3)));
        assert_eq!(Color::parse("rgba(1,2,3)"), None);
        assert_eq!(Color::parse("teal"), None);
    }

    #[test]
    fn test_display_roundtrip_through_ron() {
        let c = Color::rgba(10, 12, 28, 0.75);
        let text = ron::to_string(&c).unwrap();
        let back: Color = ron::from_str(&text).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_mix_endpoints() {
        let a = Color::rgb(0, 0, 0);
        let b = Color::rgb(200, 100, 50);
        assert_eq!(a.mix(b, 0.0), a);
        assert_eq!(a.mix(b, 1.0), b);
        assert_eq!(a.mix(b, 0.5), Color::rgb(100, 50, 25));
    }
}
