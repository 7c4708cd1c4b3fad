//! Resampling policies.
//!
//! Upsampling and downsampling are configured independently. A policy is either
//! `Fast` (nearest-neighbour scaling) or `HighQuality`, which applies a named
//! interpolation filter followed by a blur coefficient:
//!
//! - `blur == 1.0` leaves the filtered result untouched
//! - `blur > 1.0` softens with a gaussian of sigma `blur - 1.0`
//! - `blur < 1.0` sharpens with an unsharp mask of sigma `1.0 - blur`

use clap::ValueEnum;
use image::imageops::FilterType;
use image::DynamicImage;
use serde::Serialize;

use crate::error::ConfigError;

/// Default blur coefficient (no additional blur or sharpening).
pub const DEFAULT_BLUR: f32 = 1.0;

/// Interpolation filter used by high-quality resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// How a raster is scaled to a zoom level's dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ResamplePolicy {
    /// Nearest-neighbour scaling, no quality settings
    Fast,

    /// Filtered resize with a blur/sharpen coefficient
    HighQuality { filter: ResampleFilter, blur: f32 },
}

impl ResamplePolicy {
    /// Default policy for levels above the normalize zoom.
    pub fn default_upsample() -> Self {
        ResamplePolicy::HighQuality {
            filter: ResampleFilter::CatmullRom,
            blur: DEFAULT_BLUR,
        }
    }

    /// Default policy for levels below the normalize zoom.
    pub fn default_downsample() -> Self {
        ResamplePolicy::HighQuality {
            filter: ResampleFilter::Lanczos3,
            blur: DEFAULT_BLUR,
        }
    }

    /// Check the blur coefficient of a high-quality policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ResamplePolicy::Fast => Ok(()),
            ResamplePolicy::HighQuality { blur, .. } => {
                if blur.is_finite() && *blur > 0.0 {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidBlur(blur.to_string()))
                }
            }
        }
    }

    /// Scale `raster` to exactly `width` x `height`.
    pub fn apply(&self, raster: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        match *self {
            ResamplePolicy::Fast => raster.resize_exact(width, height, FilterType::Nearest),
            ResamplePolicy::HighQuality { filter, blur } => {
                let resized = raster.resize_exact(width, height, filter.into());
                if blur > DEFAULT_BLUR {
                    resized.blur(blur - DEFAULT_BLUR)
                } else if blur < DEFAULT_BLUR {
                    resized.unsharpen(DEFAULT_BLUR - blur, 0)
                } else {
                    resized
                }
            }
        }
    }
}
