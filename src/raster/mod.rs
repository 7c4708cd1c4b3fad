//! Raster backend layer.
//!
//! The pyramid pipeline never touches pixels directly. Decoding, resampling,
//! cropping, canvas extension and encoding all go through [`RasterBackend`],
//! with [`ImageBackend`] as the `image` crate implementation.
//!
//! # Components
//!
//! - [`RasterBackend`]: pixel operations used by the pipeline
//! - [`ImageBackend`]: default backend on top of the `image` crate
//! - [`ResamplePolicy`]: fast or filtered scaling, configured per direction
//! - [`FillColor`]: padding color for edge tiles
//! - [`TileFormat`]: PNG or JPEG family and its file extension
//! - [`TileEncoder`]: raster to file bytes

mod backend;
mod color;
mod encoder;
mod format;
mod resample;

pub use backend::{ImageBackend, RasterBackend};
pub use color::FillColor;
pub use encoder::{
    clamp_quality, is_valid_quality, TileEncoder, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY,
    MIN_JPEG_QUALITY,
};
pub use format::TileFormat;
pub use resample::{ResampleFilter, ResamplePolicy, DEFAULT_BLUR};
