//! Zoom level planning.
//!
//! Every zoom level is a power-of-two rescaling of the source image. The
//! normalize level keeps the source dimensions; each level above doubles them
//! and each level below halves them, rounding half away from zero.

use serde::Serialize;

use super::config::TilingConfig;

/// Target raster dimensions for `zoom`.
///
/// Pure function: returns `(width, height)` of the level raster given the
/// reference (source) dimensions and the normalize level.
///
/// ```
/// use raster_tiler::pyramid::size_for_zoom;
///
/// assert_eq!(size_for_zoom(4096, 2048, 4, 4), (4096, 2048));
/// assert_eq!(size_for_zoom(4096, 2048, 5, 4), (8192, 4096));
/// assert_eq!(size_for_zoom(4096, 2048, 0, 4), (256, 128));
/// assert_eq!(size_for_zoom(5, 3, 3, 4), (3, 2));
/// ```
pub fn size_for_zoom(
    reference_width: u32,
    reference_height: u32,
    zoom: u32,
    zoom_normalize: u32,
) -> (u64, u64) {
    let width = u64::from(reference_width);
    let height = u64::from(reference_height);

    if zoom > zoom_normalize {
        let shift = zoom - zoom_normalize;
        (scale_up(width, shift), scale_up(height, shift))
    } else if zoom < zoom_normalize {
        let shift = zoom_normalize - zoom;
        (scale_down(width, shift), scale_down(height, shift))
    } else {
        (width, height)
    }
}

fn scale_up(value: u64, shift: u32) -> u64 {
    match 1u64.checked_shl(shift) {
        Some(factor) => value.saturating_mul(factor),
        None if value == 0 => 0,
        None => u64::MAX,
    }
}

/// `round(value / 2^shift)`, halves rounded up.
fn scale_down(value: u64, shift: u32) -> u64 {
    if shift >= u64::BITS {
        return 0;
    }
    let half = 1u64 << (shift - 1);
    // value < 2^32, so the sum cannot overflow
    (value + half) >> shift
}

/// Column and row counts of a `width` x `height` raster cut into
/// `tile_size` squares.
pub fn grid_size(width: u64, height: u64, tile_size: u32) -> (u64, u64) {
    let tile_size = u64::from(tile_size.max(1));
    (width.div_ceil(tile_size), height.div_ceil(tile_size))
}

// =============================================================================
// ZoomLevel
// =============================================================================

/// One planned pyramid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoomLevel {
    pub zoom: u32,
    pub width: u64,
    pub height: u64,
    pub columns: u64,
    pub rows: u64,
}

impl ZoomLevel {
    pub fn new(zoom: u32, width: u64, height: u64, tile_size: u32) -> Self {
        let (columns, rows) = grid_size(width, height, tile_size);
        Self {
            zoom,
            width,
            height,
            columns,
            rows,
        }
    }

    /// Number of tiles in the grid, saturating at `u64::MAX`.
    pub fn tile_count(&self) -> u64 {
        self.columns.saturating_mul(self.rows)
    }

    /// Dimensions as `u32`, or `None` if the level is too large for a raster.
    pub fn raster_dimensions(&self) -> Option<(u32, u32)> {
        Some((
            u32::try_from(self.width).ok()?,
            u32::try_from(self.height).ok()?,
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// =============================================================================
// LevelPlan
// =============================================================================

/// Levels of a non-empty source never shrink below one pixel.
fn at_least_one_pixel(planned: u64, source: u32) -> u64 {
    if source == 0 {
        planned
    } else {
        planned.max(1)
    }
}

/// All levels of a pyramid for a given source size.
#[derive(Debug, Clone, Serialize)]
pub struct LevelPlan {
    pub source_width: u32,
    pub source_height: u32,
    pub tile_size: u32,
    pub zoom_normalize: u32,
    /// Levels in ascending zoom order
    pub levels: Vec<ZoomLevel>,
}

impl LevelPlan {
    pub fn new(config: &TilingConfig, source_width: u32, source_height: u32) -> Self {
        let levels = config
            .zooms_ascending()
            .map(|zoom| {
                let (width, height) = size_for_zoom(
                    source_width,
                    source_height,
                    zoom,
                    config.zoom_normalize(),
                );
                ZoomLevel::new(
                    zoom,
                    at_least_one_pixel(width, source_width),
                    at_least_one_pixel(height, source_height),
                    config.tile_size(),
                )
            })
            .collect();

        Self {
            source_width,
            source_height,
            tile_size: config.tile_size(),
            zoom_normalize: config.zoom_normalize(),
            levels,
        }
    }

    pub fn level(&self, zoom: u32) -> Option<&ZoomLevel> {
        self.levels.iter().find(|level| level.zoom == zoom)
    }

    /// Levels in building order (highest zoom first).
    pub fn descending(&self) -> impl Iterator<Item = &ZoomLevel> {
        self.levels.iter().rev()
    }

    /// Tiles over all levels, saturating at `u64::MAX`.
    pub fn total_tiles(&self) -> u64 {
        self.levels
            .iter()
            .map(ZoomLevel::tile_count)
            .fold(0, u64::saturating_add)
    }

    /// First level with a zero dimension, if any.
    pub fn first_empty(&self) -> Option<&ZoomLevel> {
        self.levels.iter().find(|level| level.is_empty())
    }
}
