//! Tile output formats.
//!
//! Formats are grouped into two families. Every accepted name maps onto one
//! family, and the family decides both the encoder and the default file
//! extension.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::FormatError;

/// Format names accepted for the JPEG family.
const JPEG_ALIASES: &[&str] = &["jpeg", "jpg", "jp2", "jpc", "jxr"];

/// Format names accepted for the PNG family.
const PNG_ALIASES: &[&str] = &["png", "png00", "png8", "png24", "png32", "png64"];

/// Encoding family used for tiles and base images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    /// Lossless PNG, supports a transparent fill color
    #[default]
    Png,

    /// Lossy JPEG, honors the configured quality
    Jpeg,
}

impl TileFormat {
    /// Default file extension for this family, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Png => "png",
            TileFormat::Jpeg => "jpg",
        }
    }

    /// Whether the format can store an alpha channel.
    pub fn supports_alpha(&self) -> bool {
        matches!(self, TileFormat::Png)
    }

    /// The matching `image` crate format.
    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            TileFormat::Png => image::ImageFormat::Png,
            TileFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl FromStr for TileFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();

        if JPEG_ALIASES.contains(&lower.as_str()) {
            Ok(TileFormat::Jpeg)
        } else if PNG_ALIASES.contains(&lower.as_str()) {
            Ok(TileFormat::Png)
        } else {
            Err(FormatError::UnsupportedFormat {
                format: s.to_string(),
            })
        }
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileFormat::Png => f.write_str("png"),
            TileFormat::Jpeg => f.write_str("jpeg"),
        }
    }
}
