//! # Raster Tiler
//!
//! Cuts one large raster image into a multi-resolution tile pyramid for
//! pan/zoom viewers (Leaflet, OpenLayers and friends).
//!
//! For every zoom level in `zoom_min..=zoom_max` the source is resampled to
//! `source_size * 2^(zoom - zoom_normalize)` and cut into square tiles that are
//! written as `<out>/<zoom>/<x>/<y>.<ext>`.
//!
//! ## Features
//!
//! - **Configurable normalization**: any zoom level can map 1:1 to the source
//! - **XYZ and TMS row numbering**, with fill-color padding on edge tiles
//! - **Resumable**: existing level rasters and tiles are skipped unless
//!   overwriting is requested
//! - **Atomic writes**: tiles appear fully written or not at all
//! - **Parallel slicing** on a rayon pool, with cooperative cancellation
//! - **Optional optimizer** hook for external tools such as optipng
//!
//! ## Architecture
//!
//! - [`raster`] - Pixel backend, encoders, resampling policies
//! - [`pyramid`] - Planner, level builder, slicer, tile store, orchestrator
//! - [`optimize`] - Post-write file optimizers
//! - [`config`] - CLI and environment configuration
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use raster_tiler::{Tiler, TilingConfig, TileScheme};
//!
//! let config = TilingConfig::builder()
//!     .zoom_range(0, 5)
//!     .tile_scheme(TileScheme::BottomLeft)
//!     .fill_color("#ffffff")
//!     .build()?;
//!
//! let report = Tiler::new(config).process(Path::new("map.png"), Path::new("tiles"))?;
//! assert!(!report.cancelled);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod optimize;
pub mod pyramid;
pub mod raster;

// Re-export commonly used types
pub use config::{Cli, Command, PlanArgs, TileArgs};
pub use error::{BackendError, ConfigError, FormatError, Phase, TilerError};
pub use optimize::{CommandOptimizer, NoOpOptimizer, OptimizeError, Optimizer, OptimizerCommand};
pub use pyramid::{
    CancelToken, LevelPlan, PathTemplate, RunReport, TileScheme, Tiler, TilingConfig,
    TilingConfigBuilder, ZoomLevel,
};
pub use raster::{
    FillColor, ImageBackend, RasterBackend, ResampleFilter, ResamplePolicy, TileFormat,
};
