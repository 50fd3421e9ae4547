//! RGBA colours.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing a `#rrggbb` or `#rrggbbaa` colour string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("colour must start with '#'")]
    MissingHash,

    #[error("colour must have 6 or 8 hex digits, got {0}")]
    BadLength(usize),

    #[error("invalid hex digits in colour: {0}")]
    BadDigits(String),
}

/// 8-bit RGBA colour, not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    /// Default map background (pale land colour).
    pub const MAP_BACKGROUND: Rgba = Rgba::new(0xf2, 0xef, 0xe9, 0xff);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').ok_or(ColorParseError::MissingHash)?;
        if hex.len() != 6 && hex.len() != 8 {
            return Err(ColorParseError::BadLength(hex.len()));
        }

        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ColorParseError::BadDigits(hex.to_string()))
        };

        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

/// Formats as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb() {
        let color: Rgba = "#f2efe9".parse().unwrap();
        assert_eq!(color, Rgba::MAP_BACKGROUND);
    }

    #[test]
    fn test_parse_rgba() {
        let color: Rgba = "#10203040".parse().unwrap();
        assert_eq!(color, Rgba::new(0x10, 0x20, 0x30, 0x40));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("fff".parse::<Rgba>(), Err(ColorParseError::MissingHash));
        assert_eq!("#fff".parse::<Rgba>(), Err(ColorParseError::BadLength(3)));
        assert!(matches!(
            "#gg0000".parse::<Rgba>(),
            Err(ColorParseError::BadDigits(_))
        ));
    }

    #[test]
    fn test_display_omits_opaque_alpha() {
        assert_eq!(Rgba::opaque(1, 2, 255).to_string(), "#0102ff");
        assert_eq!(Rgba::new(1, 2, 3, 4).to_string(), "#01020304");
    }
}
