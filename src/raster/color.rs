//! Fill color used to pad edge tiles.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use serde::{Serialize, Serializer};

use crate::error::ConfigError;

/// An RGBA color used for pixels outside the source raster.
///
/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` (leading `#` optional) and the
/// keyword `transparent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FillColor(Rgba<u8>);

impl FillColor {
    /// Opaque black, the default fill.
    pub const BLACK: FillColor = FillColor(Rgba([0, 0, 0, 255]));

    /// Fully transparent black.
    pub const TRANSPARENT: FillColor = FillColor(Rgba([0, 0, 0, 0]));

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(Rgba([r, g, b, a]))
    }

    pub fn rgba(&self) -> Rgba<u8> {
        self.0
    }

    pub fn is_opaque(&self) -> bool {
        self.0[3] == u8::MAX
    }
}

impl Default for FillColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for FillColor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidFillColor {
            value: s.to_string(),
        };

        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());

        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(invalid)? as u8;
                    rgb[i] = v * 17;
                }
                Ok(Self::new(rgb[0], rgb[1], rgb[2], u8::MAX))
            }
            6 => Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, u8::MAX)),
            8 => Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0 .0;
        if a == u8::MAX {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl Serialize for FillColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
