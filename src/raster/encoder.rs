//! Tile encoder.
//!
//! Turns an in-memory raster into the bytes of a PNG or JPEG file.
//!
//! # Design Decisions
//!
//! - **Alpha handling**: PNG keeps whatever channels the raster has. JPEG has
//!   no alpha channel, so rasters are converted to RGB before encoding.
//!
//! - **Quality control**: JPEG quality comes from the tiling configuration and
//!   is clamped to the encoder's 1-100 range. PNG ignores it.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::DynamicImage;

use crate::error::BackendError;

use super::format::TileFormat;

/// Default JPEG quality (0-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum quality the JPEG encoder accepts.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Tile Encoder
// =============================================================================

/// Encoder for tiles and base images.
///
/// # Example
///
/// ```
/// use image::{DynamicImage, RgbImage};
/// use raster_tiler::raster::{TileEncoder, TileFormat};
///
/// let encoder = TileEncoder::new();
/// let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
///
/// let png = encoder.encode(&img, TileFormat::Png, 80).unwrap();
/// assert_eq!(&png[..4], b"\x89PNG");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TileEncoder {}

impl TileEncoder {
    /// Create a new tile encoder.
    pub fn new() -> Self {
        Self {}
    }

    /// Encode `raster` in the given format.
    ///
    /// # Arguments
    ///
    /// * `raster` - Pixels to encode
    /// * `format` - Output family
    /// * `quality` - JPEG quality (0-100), ignored for PNG
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Encode`] if the codec rejects the raster.
    pub fn encode(
        &self,
        raster: &DynamicImage,
        format: TileFormat,
        quality: u8,
    ) -> Result<Bytes, BackendError> {
        let mut output = Vec::new();

        let result = match format {
            TileFormat::Png => raster.write_with_encoder(PngEncoder::new(&mut output)),
            TileFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut output, clamp_quality(quality));
                let rgb = DynamicImage::ImageRgb8(raster.to_rgb8());
                rgb.write_with_encoder(encoder)
            }
        };

        result.map_err(|e| BackendError::Encode {
            message: e.to_string(),
        })?;

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Validate a configured JPEG quality.
///
/// Returns `true` if quality is at most 100. Zero is accepted and encoded as 1.
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    quality <= MAX_JPEG_QUALITY
}

/// Clamp quality to the range the JPEG encoder accepts.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
