//! Post-write file optimization.
//!
//! After a tile has been encoded and staged next to its final path, an
//! [`Optimizer`] may shrink the staged file in place before it is renamed
//! into place. Optimization is best-effort: the tile store logs failures and
//! keeps the tile as written.
//!
//! - [`CommandOptimizer`]: runs external tools (optipng, jpegoptim, ...)
//! - [`NoOpOptimizer`]: does nothing, used when optimization is disabled

mod command;
mod noop;

use std::path::Path;

use thiserror::Error;

use crate::raster::TileFormat;

pub use command::{CommandOptimizer, OptimizerCommand};
pub use noop::NoOpOptimizer;

/// Errors from an optimizer run. Never fatal to a tiling run.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The tool could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but reported failure
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Format-aware, in-place file optimizer.
pub trait Optimizer: Send + Sync {
    /// Optimize the file at `path`, which holds an image in `format`.
    fn optimize(&self, path: &Path, format: TileFormat) -> Result<(), OptimizeError>;
}
