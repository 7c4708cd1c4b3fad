//! Level raster construction.
//!
//! Levels are built from the highest zoom down. Each level is resampled from
//! the decoded source image, never from a neighbouring level, so resampling
//! error does not compound across the pyramid.
//!
//! With `persist_base_images` the level raster is written to
//! `<out_dir>/<zoom>.<ext>` and dropped. Otherwise it is handed straight to a
//! caller-supplied sink (the slicer) and dropped afterwards.

use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info};

use crate::error::{BackendError, TilerError};
use crate::raster::RasterBackend;

use super::cancel::CancelToken;
use super::config::TilingConfig;
use super::planner::{LevelPlan, ZoomLevel};
use super::store::TileStore;

/// Counters for the level building phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub built: u32,
    pub skipped: u32,
    pub cancelled: bool,
}

/// Resamples the source image into one raster per zoom level.
pub struct BaseImageBuilder<'a, B: RasterBackend> {
    backend: &'a B,
    config: &'a TilingConfig,
    store: &'a TileStore<'a, B>,
}

impl<'a, B: RasterBackend> BaseImageBuilder<'a, B> {
    pub fn new(backend: &'a B, config: &'a TilingConfig, store: &'a TileStore<'a, B>) -> Self {
        Self {
            backend,
            config,
            store,
        }
    }

    /// Whether `level` has to be (re)built.
    ///
    /// Persisted levels are skipped when their file exists and overwriting is
    /// off. Inline levels are skipped when every tile already exists and tile
    /// overwriting is off.
    pub fn level_pending(&self, level: &ZoomLevel) -> bool {
        if self.config.persist_base_images() {
            return self.config.overwrite_base_image()
                || !self.store.base_image_path(level.zoom).is_file();
        }

        if self.config.overwrite_tile_image() {
            return true;
        }

        let (Ok(columns), Ok(rows)) = (u32::try_from(level.columns), u32::try_from(level.rows))
        else {
            return true;
        };
        (0..columns).any(|x| (0..rows).any(|y| self.store.tile_pending(level.zoom, x, y)))
    }

    /// Resample `source` to the dimensions of `level`.
    pub fn build_level(
        &self,
        source: &DynamicImage,
        level: &ZoomLevel,
    ) -> Result<DynamicImage, TilerError> {
        if level.is_empty() {
            return Err(TilerError::EmptyLevel {
                zoom: level.zoom,
                width: level.width,
                height: level.height,
            });
        }

        let (width, height) = level.raster_dimensions().ok_or(TilerError::Resample {
            zoom: level.zoom,
            source: BackendError::DimensionsTooLarge {
                width: level.width,
                height: level.height,
            },
        })?;

        match self.config.resample_policy_for(level.zoom) {
            Some(policy) => self
                .backend
                .resample(source, width, height, &policy)
                .map_err(|source| TilerError::Resample {
                    zoom: level.zoom,
                    source,
                }),
            None => Ok(source.clone()),
        }
    }

    /// Build every pending level of `plan`, highest zoom first.
    ///
    /// The source is decoded lazily, only if at least one level is pending.
    /// In inline mode `sink` receives each freshly built level raster; in
    /// persisted mode it is never called.
    pub fn build_all<F>(
        &self,
        source_path: &Path,
        plan: &LevelPlan,
        cancel: &CancelToken,
        mut sink: F,
    ) -> Result<BuildSummary, TilerError>
    where
        F: FnMut(&ZoomLevel, DynamicImage) -> Result<(), TilerError>,
    {
        let mut summary = BuildSummary::default();
        let mut pending = Vec::new();

        for level in plan.descending() {
            if self.level_pending(level) {
                pending.push(*level);
            } else {
                if self.config.persist_base_images() {
                    info!(
                        "base image for zoom level {} already exists: {}",
                        level.zoom,
                        self.store.base_image_path(level.zoom).display()
                    );
                } else {
                    info!("all tiles for zoom level {} already exist", level.zoom);
                }
                summary.skipped += 1;
            }
        }

        if pending.is_empty() {
            return Ok(summary);
        }

        let source = self
            .backend
            .load(source_path)
            .map_err(|e| TilerError::Input {
                path: source_path.to_path_buf(),
                message: e.to_string(),
            })?;

        info!(
            "input image loaded: [{}x{}] {}",
            source.width(),
            source.height(),
            source_path.display()
        );

        for level in &pending {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let raster = self.build_level(&source, level)?;

            if self.config.persist_base_images() {
                let path = self.store.store_base_image(&raster, level.zoom)?;
                drop(raster);
                info!(
                    "created image for zoom level {} [{}x{}] {}",
                    level.zoom,
                    level.width,
                    level.height,
                    path.display()
                );
            } else {
                debug!(
                    "created image for zoom level {} [{}x{}]",
                    level.zoom, level.width, level.height
                );
                sink(level, raster)?;
            }

            summary.built += 1;
        }

        Ok(summary)
    }
}
