//! Raster backend built on the `image` crate.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bytes::Bytes;
use image::{imageops, DynamicImage, ImageReader, Limits, RgbaImage};

use crate::error::BackendError;

use super::color::FillColor;
use super::encoder::TileEncoder;
use super::format::TileFormat;
use super::resample::ResamplePolicy;

// =============================================================================
// RasterBackend Trait
// =============================================================================

/// Pixel operations the pyramid pipeline needs.
///
/// Rasters are owned [`DynamicImage`] values: every operation returns a fresh
/// raster and the caller releases it by dropping it. Implementations must be
/// shareable across the tile worker pool.
pub trait RasterBackend: Send + Sync {
    /// Fail if the backend cannot encode `format`.
    fn ensure_available(&self, format: TileFormat) -> Result<(), BackendError>;

    /// Read image dimensions without decoding pixel data.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), BackendError>;

    /// Decode an image file.
    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Scale to exactly `width` x `height` using `policy`.
    fn resample(
        &self,
        raster: &DynamicImage,
        width: u32,
        height: u32,
        policy: &ResamplePolicy,
    ) -> Result<DynamicImage, BackendError>;

    /// Copy the rectangle at (`x`, `y`). The rectangle is clipped to the raster.
    fn crop(&self, raster: &DynamicImage, x: u32, y: u32, width: u32, height: u32) -> DynamicImage;

    /// Place `raster` at (`x_offset`, `y_offset`) on a `width` x `height`
    /// canvas filled with `fill`.
    fn extend_canvas(
        &self,
        raster: &DynamicImage,
        width: u32,
        height: u32,
        x_offset: u32,
        y_offset: u32,
        fill: FillColor,
    ) -> DynamicImage;

    /// Encode to file bytes. `quality` only applies to JPEG.
    fn encode(
        &self,
        raster: &DynamicImage,
        format: TileFormat,
        quality: u8,
    ) -> Result<Bytes, BackendError>;
}

// =============================================================================
// ImageBackend
// =============================================================================

/// [`RasterBackend`] backed by the `image` crate.
///
/// Stateless apart from the decoder allocation budget, so a single instance is
/// shared by all workers.
#[derive(Debug, Clone, Default)]
pub struct ImageBackend {
    memory_budget: Option<u64>,
    encoder: TileEncoder,
}

impl ImageBackend {
    /// Create a backend without a decoder allocation limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit decoder allocations to `bytes`.
    pub fn with_memory_budget(mut self, bytes: Option<u64>) -> Self {
        self.memory_budget = bytes;
        self
    }

    fn limits(&self) -> Limits {
        let mut limits = Limits::no_limits();
        limits.max_alloc = self.memory_budget;
        limits
    }

    fn open(&self, path: &Path) -> Result<ImageReader<BufReader<File>>, BackendError> {
        let decode_error = |message: String| BackendError::Decode {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = ImageReader::open(path)
            .map_err(|e| decode_error(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| decode_error(e.to_string()))?;
        reader.limits(self.limits());
        Ok(reader)
    }
}

impl RasterBackend for ImageBackend {
    fn ensure_available(&self, format: TileFormat) -> Result<(), BackendError> {
        let image_format = format.image_format();
        if image_format.reading_enabled() && image_format.writing_enabled() {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!(
                "{format} codec is not compiled into this build"
            )))
        }
    }

    fn dimensions(&self, path: &Path) -> Result<(u32, u32), BackendError> {
        self.open(path)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        self.open(path)?.decode().map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn resample(
        &self,
        raster: &DynamicImage,
        width: u32,
        height: u32,
        policy: &ResamplePolicy,
    ) -> Result<DynamicImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::Resample {
                message: format!("cannot resample to {width}x{height}"),
            });
        }

        if (raster.width(), raster.height()) == (width, height) {
            return Ok(raster.clone());
        }

        Ok(policy.apply(raster, width, height))
    }

    fn crop(
        &self,
        raster: &DynamicImage,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> DynamicImage {
        raster.crop_imm(x, y, width, height)
    }

    fn extend_canvas(
        &self,
        raster: &DynamicImage,
        width: u32,
        height: u32,
        x_offset: u32,
        y_offset: u32,
        fill: FillColor,
    ) -> DynamicImage {
        let mut canvas = RgbaImage::from_pixel(width, height, fill.rgba());
        imageops::replace(&mut canvas, raster, i64::from(x_offset), i64::from(y_offset));
        DynamicImage::ImageRgba8(canvas)
    }

    fn encode(
        &self,
        raster: &DynamicImage,
        format: TileFormat,
        quality: u8,
    ) -> Result<Bytes, BackendError> {
        self.encoder.encode(raster, format, quality)
    }
}
