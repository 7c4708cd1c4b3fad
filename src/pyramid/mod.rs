//! Tile pyramid pipeline.
//!
//! This module turns one source raster into a directory of fixed-size tiles,
//! one grid per zoom level:
//!
//! ```text
//!                    ┌────────────┐
//!   source image ──▶ │  planner   │  level dimensions + grid sizes
//!                    └─────┬──────┘
//!                          ▼
//!                    ┌────────────┐     <out>/<z>.<ext>
//!                    │  builder   │ ──▶ (persisted level rasters)
//!                    └─────┬──────┘
//!                          ▼
//!                    ┌────────────┐     <out>/<z>/<x>/<y>.<ext>
//!                    │  slicer    │ ──▶ (tiles, via TileStore)
//!                    └────────────┘
//! ```
//!
//! [`Tiler`] drives the phases; the other types are exposed for callers that
//! want to plan or slice on their own.

mod builder;
mod cancel;
mod config;
mod orchestrator;
mod planner;
mod slicer;
mod store;
mod template;

pub use builder::{BaseImageBuilder, BuildSummary};
pub use cancel::CancelToken;
pub use config::{
    TileScheme, TilingConfig, TilingConfigBuilder, DEFAULT_TILE_SIZE, DEFAULT_ZOOM_MAX,
    DEFAULT_ZOOM_MIN, MAX_UPSCALE_SPAN,
};
pub use orchestrator::{RunReport, Tiler};
pub use planner::{grid_size, size_for_zoom, LevelPlan, ZoomLevel};
pub use slicer::{SliceSummary, TileGrid, TileGridSlicer, TileRect};
pub use store::TileStore;
pub use template::{PathTemplate, DEFAULT_TEMPLATE};
