//! Tile grid slicing.
//!
//! A level raster of `W` x `H` pixels is cut into `ceil(W / T)` columns and
//! `ceil(H / T)` rows of `T` x `T` tiles. Tiles on the right and on the far
//! row that overhang the raster are padded with the fill color so every tile
//! has the full size.
//!
//! Row offsets depend on the scheme:
//!
//! ```text
//! TopLeft     cy = row * T                 padding below the content
//! BottomLeft  cy = H - (row + 1) * T       padding above the content
//! ```
//!
//! Columns are processed in parallel on the current rayon pool; rows within a
//! column run in order.

use std::sync::atomic::{AtomicU64, Ordering};

use image::DynamicImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::TilerError;
use crate::raster::RasterBackend;

use super::cancel::CancelToken;
use super::config::{TileScheme, TilingConfig};
use super::store::TileStore;

// =============================================================================
// Grid Geometry
// =============================================================================

/// Source rectangle of one tile and where it lands inside the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub column: u32,
    pub row: u32,
    /// Left edge in the level raster
    pub x: u32,
    /// Top edge in the level raster
    pub y: u32,
    /// Width of the raster content
    pub width: u32,
    /// Height of the raster content
    pub height: u32,
    /// Horizontal position of the content inside the tile
    pub offset_x: u32,
    /// Vertical position of the content inside the tile
    pub offset_y: u32,
}

impl TileRect {
    /// True when the content does not cover the whole tile.
    pub fn needs_padding(&self, tile_size: u32) -> bool {
        self.width < tile_size || self.height < tile_size
    }
}

/// Tile grid over one level raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: u32,
    scheme: TileScheme,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, tile_size: u32, scheme: TileScheme) -> Self {
        Self {
            width,
            height,
            tile_size: tile_size.max(1),
            scheme,
        }
    }

    pub fn columns(&self) -> u32 {
        self.width.div_ceil(self.tile_size)
    }

    pub fn rows(&self) -> u32 {
        self.height.div_ceil(self.tile_size)
    }

    pub fn tile_count(&self) -> u64 {
        u64::from(self.columns()) * u64::from(self.rows())
    }

    /// All `(column, row)` pairs, column by column.
    pub fn coordinates(&self) -> impl Iterator<Item = (u32, u32)> {
        let rows = self.rows();
        (0..self.columns()).flat_map(move |column| (0..rows).map(move |row| (column, row)))
    }

    /// Geometry of tile (`column`, `row`).
    pub fn rect(&self, column: u32, row: u32) -> TileRect {
        let ts = i64::from(self.tile_size);
        let width = i64::from(self.width);
        let height = i64::from(self.height);

        let cx = i64::from(column) * ts;
        let cy = match self.scheme {
            TileScheme::TopLeft => i64::from(row) * ts,
            TileScheme::BottomLeft => height - (i64::from(row) + 1) * ts,
        };

        let x0 = cx.clamp(0, width);
        let x1 = (cx + ts).clamp(0, width);
        let y0 = cy.clamp(0, height);
        let y1 = (cy + ts).clamp(0, height);

        // All values are bounded by the u32 raster size or the tile size.
        TileRect {
            column,
            row,
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
            offset_x: (x0 - cx) as u32,
            offset_y: (y0 - cy) as u32,
        }
    }
}

// =============================================================================
// Slicer
// =============================================================================

/// Outcome of slicing one level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceSummary {
    pub columns: u32,
    pub rows: u32,
    pub written: u64,
    pub skipped: u64,
}

/// Cuts level rasters into tiles and hands them to a [`TileStore`].
pub struct TileGridSlicer<'a, B: RasterBackend> {
    backend: &'a B,
    config: &'a TilingConfig,
}

impl<'a, B: RasterBackend> TileGridSlicer<'a, B> {
    pub fn new(backend: &'a B, config: &'a TilingConfig) -> Self {
        Self { backend, config }
    }

    pub fn grid_for(&self, raster: &DynamicImage) -> TileGrid {
        TileGrid::new(
            raster.width(),
            raster.height(),
            self.config.tile_size(),
            self.config.tile_scheme(),
        )
    }

    /// Produce the `tile_size` x `tile_size` raster for `rect`.
    pub fn cut(&self, raster: &DynamicImage, rect: &TileRect) -> DynamicImage {
        let ts = self.config.tile_size();
        let content = self
            .backend
            .crop(raster, rect.x, rect.y, rect.width, rect.height);

        if rect.needs_padding(ts) {
            self.backend.extend_canvas(
                &content,
                ts,
                ts,
                rect.offset_x,
                rect.offset_y,
                self.config.fill_color(),
            )
        } else {
            content
        }
    }

    /// Cut every tile of the `zoom` level raster and store it.
    ///
    /// Stops dequeuing tiles once `cancel` is set; tiles in flight complete.
    /// The first store error aborts the level.
    pub fn slice(
        &self,
        zoom: u32,
        raster: &DynamicImage,
        store: &TileStore<'_, B>,
        cancel: &CancelToken,
    ) -> Result<SliceSummary, TilerError> {
        let grid = self.grid_for(raster);
        let written = AtomicU64::new(0);
        let skipped = AtomicU64::new(0);

        (0..grid.columns())
            .into_par_iter()
            .try_for_each(|column| -> Result<(), TilerError> {
                for row in 0..grid.rows() {
                    if cancel.is_cancelled() {
                        return Ok(());
                    }

                    if !store.tile_pending(zoom, column, row) {
                        debug!("tile {}/{}/{} already exists", zoom, column, row);
                        skipped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }

                    let tile = self.cut(raster, &grid.rect(column, row));
                    if store.store(&tile, zoom, column, row)? {
                        written.fetch_add(1, Ordering::Relaxed);
                    } else {
                        skipped.fetch_add(1, Ordering::Relaxed);
                    }
                }

                debug!(
                    "created column {}, zoom = {}, x = {}",
                    column,
                    zoom,
                    u64::from(column) * u64::from(self.config.tile_size())
                );
                Ok(())
            })?;

        let summary = SliceSummary {
            columns: grid.columns(),
            rows: grid.rows(),
            written: written.into_inner(),
            skipped: skipped.into_inner(),
        };

        info!(
            "created tiles for zoom level {}: {} columns, {} tile(s) per column ({} written, {} skipped)",
            zoom, summary.columns, summary.rows, summary.written, summary.skipped
        );

        Ok(summary)
    }
}
