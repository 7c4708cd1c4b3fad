//! Tile storage.
//!
//! Synthesizes output paths, applies the overwrite policy, and writes encoded
//! rasters. Writes go to a temporary file in the destination directory that is
//! renamed onto the final path, so a reader never sees a partial tile.
//!
//! # Layout
//!
//! ```text
//! <out_dir>/<zoom>.<ext>                      persisted level raster
//! <out_dir>/<template(zoom, x, y)>.<ext>      tile, default <zoom>/<x>/<y>.<ext>
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{Phase, TilerError};
use crate::optimize::Optimizer;
use crate::raster::RasterBackend;

use super::config::TilingConfig;

/// Writes tiles and level rasters below one output directory.
pub struct TileStore<'a, B: RasterBackend> {
    out_dir: &'a Path,
    config: &'a TilingConfig,
    backend: &'a B,
    optimizer: Option<&'a dyn Optimizer>,
}

impl<'a, B: RasterBackend> TileStore<'a, B> {
    pub fn new(out_dir: &'a Path, config: &'a TilingConfig, backend: &'a B) -> Self {
        Self {
            out_dir,
            config,
            backend,
            optimizer: None,
        }
    }

    /// Attach the optimizer run after each fresh tile write.
    ///
    /// It is only invoked when `optimize_output` is enabled.
    pub fn with_optimizer(mut self, optimizer: Option<&'a dyn Optimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn out_dir(&self) -> &Path {
        self.out_dir
    }

    /// Final path of tile (`zoom`, `x`, `y`).
    pub fn tile_path(&self, zoom: u32, x: u32, y: u32) -> PathBuf {
        let relative = self.config.store_path_template().render(zoom, x, y);
        self.out_dir
            .join(format!("{}.{}", relative, self.config.tile_extension()))
    }

    /// Path of the persisted level raster for `zoom`.
    pub fn base_image_path(&self, zoom: u32) -> PathBuf {
        self.out_dir
            .join(format!("{}.{}", zoom, self.config.tile_extension()))
    }

    /// Whether the tile still has to be written under the overwrite policy.
    pub fn tile_pending(&self, zoom: u32, x: u32, y: u32) -> bool {
        self.config.overwrite_tile_image() || !self.tile_path(zoom, x, y).is_file()
    }

    /// Encode and write one tile.
    ///
    /// Returns `Ok(false)` if the tile already exists and overwriting is
    /// disabled, `Ok(true)` after a fresh write. The optimizer runs on the
    /// staged file before it is renamed into place; its failures are logged
    /// and do not affect the result.
    pub fn store(
        &self,
        tile: &DynamicImage,
        zoom: u32,
        x: u32,
        y: u32,
    ) -> Result<bool, TilerError> {
        let path = self.tile_path(zoom, x, y);

        if !self.config.overwrite_tile_image() && path.is_file() {
            debug!("tile {}/{}/{} already exists: {}", zoom, x, y, path.display());
            return Ok(false);
        }

        let optimizer = self.optimizer.filter(|_| self.config.optimize_output());
        self.write_raster(tile, &path, Phase::Tiling, zoom, |staged| {
            if let Some(optimizer) = optimizer {
                if let Err(e) = optimizer.optimize(staged, self.config.tile_format()) {
                    warn!("optimizer failed for {}: {}", path.display(), e);
                }
            }
        })?;

        Ok(true)
    }

    /// Write the level raster for `zoom`. The optimizer is never run on
    /// level rasters.
    pub fn store_base_image(
        &self,
        raster: &DynamicImage,
        zoom: u32,
    ) -> Result<PathBuf, TilerError> {
        let path = self.base_image_path(zoom);
        self.write_raster(raster, &path, Phase::BuildingLevels, zoom, |_| {})?;
        Ok(path)
    }

    fn write_raster(
        &self,
        raster: &DynamicImage,
        path: &Path,
        phase: Phase,
        zoom: u32,
        before_persist: impl FnOnce(&Path),
    ) -> Result<(), TilerError> {
        let dir = path.parent().unwrap_or(self.out_dir);
        fs::create_dir_all(dir).map_err(|e| TilerError::Output {
            phase,
            path: dir.to_path_buf(),
            message: format!("cannot create directory: {e}"),
        })?;

        let write_error = |message: String| TilerError::BackendWrite {
            phase,
            zoom,
            path: path.to_path_buf(),
            message,
        };

        let bytes = self
            .backend
            .encode(raster, self.config.tile_format(), self.config.jpeg_quality())
            .map_err(|e| write_error(e.to_string()))?;

        write_atomic(dir, path, &bytes, before_persist).map_err(|e| write_error(e.to_string()))
    }
}

/// Write `bytes` to a temporary file in `dir` and rename it onto `path`.
///
/// `before_persist` sees the staged file before the rename. The staged name
/// keeps the extension of `path` so external tools can tell the format.
fn write_atomic(
    dir: &Path,
    path: &Path,
    bytes: &[u8],
    before_persist: impl FnOnce(&Path),
) -> io::Result<()> {
    let suffix = match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => ".tmp".to_string(),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".tile-").suffix(&suffix);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }

    let mut file: NamedTempFile = builder.tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_data()?;
    before_persist(file.path());
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
