//! Validated tiling configuration.
//!
//! [`TilingConfig`] is the entire tuning surface of the pipeline. It is only
//! constructed through [`TilingConfigBuilder::build`], which rejects invalid
//! combinations before any filesystem access. Once built it cannot change.
//!
//! # Example
//!
//! ```
//! use raster_tiler::pyramid::{TileScheme, TilingConfig};
//!
//! let config = TilingConfig::builder()
//!     .tile_size(256)
//!     .zoom_range(0, 5)
//!     .zoom_normalize(4)
//!     .tile_scheme(TileScheme::BottomLeft)
//!     .tile_format("jpeg")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.tile_extension(), "jpg");
//! ```

use clap::ValueEnum;
use serde::Serialize;

use crate::error::ConfigError;
use crate::raster::{
    is_valid_quality, FillColor, ResamplePolicy, TileFormat, DEFAULT_JPEG_QUALITY,
};

use super::template::{PathTemplate, DEFAULT_TEMPLATE};

// =============================================================================
// Defaults
// =============================================================================

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default minimum zoom level.
pub const DEFAULT_ZOOM_MIN: u32 = 0;

/// Default maximum zoom level.
pub const DEFAULT_ZOOM_MAX: u32 = 8;

/// Largest supported distance between the normalize level and the maximum
/// zoom (upscale factor 2^31).
pub const MAX_UPSCALE_SPAN: u32 = 31;

// =============================================================================
// Tile Scheme
// =============================================================================

/// Row numbering convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileScheme {
    /// Origin at the top left, rows grow downwards (XYZ / slippy map)
    #[default]
    #[value(name = "xyz", alias = "top-left")]
    TopLeft,

    /// Origin at the bottom left, rows grow upwards (TMS)
    #[value(name = "tms", alias = "bottom-left")]
    BottomLeft,
}

// =============================================================================
// TilingConfig
// =============================================================================

/// Immutable, validated pipeline configuration.
#[derive(Debug, Clone, Serialize)]
pub struct TilingConfig {
    tile_size: u32,
    zoom_min: u32,
    zoom_max: u32,
    zoom_normalize: u32,
    tile_scheme: TileScheme,
    fill_color: FillColor,
    store_path_template: PathTemplate,
    tile_format: TileFormat,
    tile_extension: String,
    jpeg_quality: u8,
    resample_upsample: ResamplePolicy,
    resample_downsample: ResamplePolicy,
    overwrite_base_image: bool,
    overwrite_tile_image: bool,
    clean_up_base_images: bool,
    persist_base_images: bool,
    optimize_output: bool,
    memory_budget: Option<u64>,
    threads: usize,
}

impl TilingConfig {
    pub fn builder() -> TilingConfigBuilder {
        TilingConfigBuilder::default()
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn zoom_min(&self) -> u32 {
        self.zoom_min
    }

    pub fn zoom_max(&self) -> u32 {
        self.zoom_max
    }

    /// Zoom level whose raster has the source image's dimensions.
    pub fn zoom_normalize(&self) -> u32 {
        self.zoom_normalize
    }

    pub fn tile_scheme(&self) -> TileScheme {
        self.tile_scheme
    }

    pub fn fill_color(&self) -> FillColor {
        self.fill_color
    }

    pub fn store_path_template(&self) -> &PathTemplate {
        &self.store_path_template
    }

    pub fn tile_format(&self) -> TileFormat {
        self.tile_format
    }

    /// File extension without the leading dot.
    pub fn tile_extension(&self) -> &str {
        &self.tile_extension
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn resample_upsample(&self) -> ResamplePolicy {
        self.resample_upsample
    }

    pub fn resample_downsample(&self) -> ResamplePolicy {
        self.resample_downsample
    }

    /// Policy for scaling the source to `zoom`, or `None` at the normalize level.
    pub fn resample_policy_for(&self, zoom: u32) -> Option<ResamplePolicy> {
        use std::cmp::Ordering;

        match zoom.cmp(&self.zoom_normalize) {
            Ordering::Greater => Some(self.resample_upsample),
            Ordering::Less => Some(self.resample_downsample),
            Ordering::Equal => None,
        }
    }

    pub fn overwrite_base_image(&self) -> bool {
        self.overwrite_base_image
    }

    pub fn overwrite_tile_image(&self) -> bool {
        self.overwrite_tile_image
    }

    pub fn clean_up_base_images(&self) -> bool {
        self.clean_up_base_images
    }

    pub fn persist_base_images(&self) -> bool {
        self.persist_base_images
    }

    pub fn optimize_output(&self) -> bool {
        self.optimize_output
    }

    /// Decoder allocation limit in bytes.
    pub fn memory_budget(&self) -> Option<u64> {
        self.memory_budget
    }

    /// Worker threads for tile generation, 0 means one per core.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Zoom levels in building order (highest first).
    pub fn zooms_descending(&self) -> impl Iterator<Item = u32> {
        (self.zoom_min..=self.zoom_max).rev()
    }

    /// Zoom levels in tiling order (lowest first).
    pub fn zooms_ascending(&self) -> impl Iterator<Item = u32> {
        self.zoom_min..=self.zoom_max
    }
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            zoom_min: DEFAULT_ZOOM_MIN,
            zoom_max: DEFAULT_ZOOM_MAX,
            zoom_normalize: DEFAULT_ZOOM_MAX,
            tile_scheme: TileScheme::TopLeft,
            fill_color: FillColor::BLACK,
            store_path_template: PathTemplate::default(),
            tile_format: TileFormat::Png,
            tile_extension: TileFormat::Png.extension().to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            resample_upsample: ResamplePolicy::default_upsample(),
            resample_downsample: ResamplePolicy::default_downsample(),
            overwrite_base_image: false,
            overwrite_tile_image: false,
            clean_up_base_images: true,
            persist_base_images: true,
            optimize_output: false,
            memory_budget: None,
            threads: 0,
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`TilingConfig`].
///
/// String-typed settings (format, fill color, template) are parsed in
/// [`build`](Self::build) so every error surfaces at the same point.
#[derive(Debug, Clone)]
pub struct TilingConfigBuilder {
    tile_size: u32,
    zoom_min: u32,
    zoom_max: u32,
    zoom_normalize: Option<u32>,
    tile_scheme: TileScheme,
    fill_color: String,
    store_path_template: String,
    tile_format: String,
    tile_extension: Option<String>,
    jpeg_quality: u8,
    resample_upsample: ResamplePolicy,
    resample_downsample: ResamplePolicy,
    overwrite_base_image: bool,
    overwrite_tile_image: bool,
    clean_up_base_images: bool,
    persist_base_images: bool,
    optimize_output: bool,
    memory_budget: Option<u64>,
    threads: usize,
}

impl Default for TilingConfigBuilder {
    fn default() -> Self {
        let defaults = TilingConfig::default();
        Self {
            tile_size: defaults.tile_size,
            zoom_min: defaults.zoom_min,
            zoom_max: defaults.zoom_max,
            zoom_normalize: None,
            tile_scheme: defaults.tile_scheme,
            fill_color: defaults.fill_color.to_string(),
            store_path_template: DEFAULT_TEMPLATE.to_string(),
            tile_format: defaults.tile_format.to_string(),
            tile_extension: None,
            jpeg_quality: defaults.jpeg_quality,
            resample_upsample: defaults.resample_upsample,
            resample_downsample: defaults.resample_downsample,
            overwrite_base_image: defaults.overwrite_base_image,
            overwrite_tile_image: defaults.overwrite_tile_image,
            clean_up_base_images: defaults.clean_up_base_images,
            persist_base_images: defaults.persist_base_images,
            optimize_output: defaults.optimize_output,
            memory_budget: defaults.memory_budget,
            threads: defaults.threads,
        }
    }
}

impl TilingConfigBuilder {
    pub fn tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn zoom_range(mut self, zoom_min: u32, zoom_max: u32) -> Self {
        self.zoom_min = zoom_min;
        self.zoom_max = zoom_max;
        self
    }

    /// Defaults to the maximum zoom when not set.
    pub fn zoom_normalize(mut self, zoom_normalize: u32) -> Self {
        self.zoom_normalize = Some(zoom_normalize);
        self
    }

    pub fn tile_scheme(mut self, scheme: TileScheme) -> Self {
        self.tile_scheme = scheme;
        self
    }

    pub fn fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = color.into();
        self
    }

    pub fn store_path_template(mut self, template: impl Into<String>) -> Self {
        self.store_path_template = template.into();
        self
    }

    pub fn tile_format(mut self, format: impl Into<String>) -> Self {
        self.tile_format = format.into();
        self
    }

    /// Override the extension derived from the format.
    pub fn tile_extension(mut self, extension: impl Into<String>) -> Self {
        self.tile_extension = Some(extension.into());
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn resample_upsample(mut self, policy: ResamplePolicy) -> Self {
        self.resample_upsample = policy;
        self
    }

    pub fn resample_downsample(mut self, policy: ResamplePolicy) -> Self {
        self.resample_downsample = policy;
        self
    }

    pub fn overwrite_base_image(mut self, overwrite: bool) -> Self {
        self.overwrite_base_image = overwrite;
        self
    }

    pub fn overwrite_tile_image(mut self, overwrite: bool) -> Self {
        self.overwrite_tile_image = overwrite;
        self
    }

    pub fn clean_up_base_images(mut self, clean_up: bool) -> Self {
        self.clean_up_base_images = clean_up;
        self
    }

    pub fn persist_base_images(mut self, persist: bool) -> Self {
        self.persist_base_images = persist;
        self
    }

    pub fn optimize_output(mut self, optimize: bool) -> Self {
        self.optimize_output = optimize;
        self
    }

    pub fn memory_budget(mut self, bytes: Option<u64>) -> Self {
        self.memory_budget = bytes;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<TilingConfig, ConfigError> {
        if self.tile_size == 0 {
            return Err(ConfigError::InvalidTileSize);
        }

        if self.zoom_min > self.zoom_max {
            return Err(ConfigError::InvalidZoomRange {
                min: self.zoom_min,
                max: self.zoom_max,
            });
        }

        let zoom_normalize = self.zoom_normalize.unwrap_or(self.zoom_max);
        if zoom_normalize < self.zoom_min || zoom_normalize > self.zoom_max {
            return Err(ConfigError::NormalizeOutOfRange {
                normalize: zoom_normalize,
                min: self.zoom_min,
                max: self.zoom_max,
            });
        }

        let upscale_span = self.zoom_max - zoom_normalize;
        if upscale_span > MAX_UPSCALE_SPAN {
            return Err(ConfigError::ZoomSpanTooLarge {
                span: upscale_span,
                max: MAX_UPSCALE_SPAN,
            });
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err(ConfigError::InvalidJpegQuality(self.jpeg_quality));
        }

        self.resample_upsample.validate()?;
        self.resample_downsample.validate()?;

        let tile_format: TileFormat = self.tile_format.parse()?;

        let fill_color: FillColor = self.fill_color.parse()?;
        if !fill_color.is_opaque() && !tile_format.supports_alpha() {
            return Err(ConfigError::TranslucentFill {
                value: self.fill_color,
                format: tile_format.to_string(),
            });
        }

        let store_path_template: PathTemplate = self.store_path_template.parse()?;

        let tile_extension = match self.tile_extension {
            Some(ext) => {
                let ext = ext.trim_start_matches('.').to_string();
                if ext.is_empty() || ext.contains(['/', '\\']) {
                    return Err(ConfigError::InvalidExtension(ext));
                }
                ext
            }
            None => tile_format.extension().to_string(),
        };

        Ok(TilingConfig {
            tile_size: self.tile_size,
            zoom_min: self.zoom_min,
            zoom_max: self.zoom_max,
            zoom_normalize,
            tile_scheme: self.tile_scheme,
            fill_color,
            store_path_template,
            tile_format,
            tile_extension,
            jpeg_quality: self.jpeg_quality,
            resample_upsample: self.resample_upsample,
            resample_downsample: self.resample_downsample,
            overwrite_base_image: self.overwrite_base_image,
            overwrite_tile_image: self.overwrite_tile_image,
            clean_up_base_images: self.clean_up_base_images,
            persist_base_images: self.persist_base_images,
            optimize_output: self.optimize_output,
            memory_budget: self.memory_budget,
            threads: self.threads,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
