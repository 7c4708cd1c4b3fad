use std::path::Path;

use super::{OptimizeError, Optimizer};
use crate::raster::TileFormat;

/// An optimizer that leaves files untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpOptimizer;

impl Optimizer for NoOpOptimizer {
    #[inline]
    fn optimize(&self, _path: &Path, _format: TileFormat) -> Result<(), OptimizeError> {
        Ok(())
    }
}
