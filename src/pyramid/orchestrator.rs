//! Pipeline orchestration.
//!
//! A run moves through a fixed sequence of phases:
//!
//! ```text
//! Validating -> BuildingLevels -> Tiling -> (CleaningUp) -> Done
//!      \              \              \            \
//!       +--------------+--------------+------------+--> Aborted (Err)
//! ```
//!
//! - **Validating**: codec availability, source readable, every planned level
//!   non-empty, output directory writable or creatable.
//! - **BuildingLevels**: [`BaseImageBuilder`] from `zoom_max` down to
//!   `zoom_min`. Without persisted base images each level is tiled right away.
//! - **Tiling**: only with persisted base images; reloads each level raster in
//!   ascending zoom order and slices it.
//! - **CleaningUp**: only with persisted base images and `clean_up_base_images`;
//!   deletes the level rasters. Failures are logged.
//!
//! Any error aborts the run. Cancellation is not an error: the run stops early
//! and returns a report with `cancelled` set.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Phase, TilerError};
use crate::optimize::Optimizer;
use crate::raster::{ImageBackend, RasterBackend};

use super::builder::BaseImageBuilder;
use super::cancel::CancelToken;
use super::config::TilingConfig;
use super::planner::LevelPlan;
use super::slicer::{SliceSummary, TileGridSlicer};
use super::store::TileStore;

// =============================================================================
// Run Report
// =============================================================================

/// Counters describing a finished (or cancelled) run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub source_width: u32,
    pub source_height: u32,
    pub levels_built: u32,
    pub levels_skipped: u32,
    pub levels_tiled: u32,
    pub tiles_written: u64,
    pub tiles_skipped: u64,
    pub base_images_removed: u32,
    pub cancelled: bool,
}

impl RunReport {
    fn add_slice(&mut self, summary: &SliceSummary) {
        self.levels_tiled += 1;
        self.tiles_written += summary.written;
        self.tiles_skipped += summary.skipped;
    }
}

// =============================================================================
// Tiler
// =============================================================================

/// Turns one source image into a tile pyramid.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use raster_tiler::pyramid::{Tiler, TilingConfig};
///
/// let config = TilingConfig::builder()
///     .zoom_range(0, 6)
///     .tile_format("jpeg")
///     .build()?;
///
/// let report = Tiler::new(config).process(Path::new("huge.png"), Path::new("tiles"))?;
/// println!("{} tiles written", report.tiles_written);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Tiler<B: RasterBackend = ImageBackend> {
    config: TilingConfig,
    backend: B,
    optimizer: Option<Arc<dyn Optimizer>>,
    cancel: CancelToken,
}

impl Tiler<ImageBackend> {
    /// Create a tiler using the `image` crate backend.
    pub fn new(config: TilingConfig) -> Self {
        let backend = ImageBackend::new().with_memory_budget(config.memory_budget());
        Self::with_backend(config, backend)
    }
}

impl<B: RasterBackend> Tiler<B> {
    pub fn with_backend(config: TilingConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            optimizer: None,
            cancel: CancelToken::new(),
        }
    }

    /// Optimizer applied to freshly written tiles when `optimize_output` is on.
    pub fn with_optimizer(mut self, optimizer: Arc<dyn Optimizer>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels runs of this tiler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &TilingConfig {
        &self.config
    }

    /// Compute the level plan for `source` without writing anything.
    pub fn plan(&self, source: &Path) -> Result<LevelPlan, TilerError> {
        let (width, height) = self.validate_source(source)?;
        Ok(LevelPlan::new(&self.config, width, height))
    }

    /// Run the whole pipeline, writing the pyramid below `out_dir`.
    pub fn process(&self, source: &Path, out_dir: &Path) -> Result<RunReport, TilerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads())
            .thread_name(|i| format!("tiler-worker-{i}"))
            .build()
            .map_err(|e| TilerError::WorkerPool(e.to_string()))?;

        pool.install(|| self.run(source, out_dir))
    }

    fn run(&self, source: &Path, out_dir: &Path) -> Result<RunReport, TilerError> {
        // Validating
        self.backend
            .ensure_available(self.config.tile_format())
            .map_err(|e| TilerError::BackendUnavailable(e.to_string()))?;
        let (width, height) = self.validate_source(source)?;
        let plan = LevelPlan::new(&self.config, width, height);
        if let Some(level) = plan.first_empty() {
            return Err(TilerError::EmptyLevel {
                zoom: level.zoom,
                width: level.width,
                height: level.height,
            });
        }
        validate_output(out_dir)?;

        info!(
            "processing image: {} [{}x{}], out path: {}",
            source.display(),
            width,
            height,
            out_dir.display()
        );

        let store = TileStore::new(out_dir, &self.config, &self.backend)
            .with_optimizer(self.optimizer.as_deref());
        let slicer = TileGridSlicer::new(&self.backend, &self.config);
        let mut report = RunReport {
            source_width: width,
            source_height: height,
            ..RunReport::default()
        };

        // BuildingLevels
        info!("building {} zoom level(s)", plan.levels.len());
        let builder = BaseImageBuilder::new(&self.backend, &self.config, &store);
        let mut inline_slices = Vec::new();
        let build = builder.build_all(source, &plan, &self.cancel, |level, raster| {
            let summary = slicer.slice(level.zoom, &raster, &store, &self.cancel)?;
            inline_slices.push(summary);
            Ok(())
        })?;

        report.levels_built = build.built;
        report.levels_skipped = build.skipped;
        for summary in &inline_slices {
            report.add_slice(summary);
        }

        if build.cancelled || self.cancel.is_cancelled() {
            return Ok(self.cancelled(report));
        }

        if !self.config.persist_base_images() {
            info!("done: {} tile(s) written", report.tiles_written);
            return Ok(report);
        }

        // Tiling
        for zoom in self.config.zooms_ascending() {
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled(report));
            }

            let path = store.base_image_path(zoom);
            if !path.is_file() {
                return Err(TilerError::Consistency { zoom, path });
            }
            let raster = self
                .backend
                .load(&path)
                .map_err(|_| TilerError::Consistency {
                    zoom,
                    path: path.clone(),
                })?;

            let summary = slicer.slice(zoom, &raster, &store, &self.cancel)?;
            report.add_slice(&summary);
        }

        if self.cancel.is_cancelled() {
            return Ok(self.cancelled(report));
        }

        // CleaningUp
        if self.config.clean_up_base_images() {
            for zoom in self.config.zooms_ascending() {
                let path = store.base_image_path(zoom);
                if !path.is_file() {
                    continue;
                }
                match fs::remove_file(&path) {
                    Ok(()) => {
                        info!("deleted base image for zoom level {}: {}", zoom, path.display());
                        report.base_images_removed += 1;
                    }
                    Err(e) => warn!(
                        "could not delete base image for zoom level {}: {}: {}",
                        zoom,
                        path.display(),
                        e
                    ),
                }
            }
        }

        info!(
            "done: {} tile(s) written, {} skipped",
            report.tiles_written, report.tiles_skipped
        );
        Ok(report)
    }

    fn cancelled(&self, mut report: RunReport) -> RunReport {
        report.cancelled = true;
        warn!(
            "cancelled after {} level(s) built, {} level(s) tiled, {} tile(s) written",
            report.levels_built, report.levels_tiled, report.tiles_written
        );
        report
    }

    fn validate_source(&self, source: &Path) -> Result<(u32, u32), TilerError> {
        let input_error = |message: String| TilerError::Input {
            path: source.to_path_buf(),
            message,
        };

        if !source.is_file() {
            return Err(input_error("not a file".to_string()));
        }
        fs::File::open(source).map_err(|e| input_error(e.to_string()))?;

        self.backend
            .dimensions(source)
            .map_err(|e| input_error(e.to_string()))
    }
}

/// Ensure `out_dir` exists and accepts new files.
fn validate_output(out_dir: &Path) -> Result<(), TilerError> {
    let output_error = |message: String| TilerError::Output {
        phase: Phase::Validating,
        path: out_dir.to_path_buf(),
        message,
    };

    fs::create_dir_all(out_dir).map_err(|e| output_error(format!("cannot create: {e}")))?;
    tempfile::tempfile_in(out_dir).map_err(|e| output_error(format!("not writable: {e}")))?;
    Ok(())
}
