//! Command line and environment configuration.
//!
//! The binary has two subcommands:
//!
//! - `tile`: run the full pipeline and write the pyramid
//! - `plan`: print the per-level dimensions and grid sizes without writing
//!
//! Both share [`TilingArgs`], which maps one-to-one onto
//! [`TilingConfig`](crate::pyramid::TilingConfig).
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use raster_tiler::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Tile(args) => println!("tiling {}", args.source.display()),
//!     Command::Plan(args) => println!("planning {}", args.source.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! Every tiling option can also be set with the `RASTER_TILER_` prefix:
//!
//! - `RASTER_TILER_TILE_SIZE` - Tile edge length in pixels (default: 256)
//! - `RASTER_TILER_ZOOM_MIN` - Lowest zoom level (default: 0)
//! - `RASTER_TILER_ZOOM_MAX` - Highest zoom level (default: 8)
//! - `RASTER_TILER_ZOOM_NORMALIZE` - Zoom level at source resolution (default: zoom max)
//! - `RASTER_TILER_SCHEME` - `xyz` or `tms` (default: xyz)
//! - `RASTER_TILER_FILL_COLOR` - Padding color (default: #000000)
//! - `RASTER_TILER_TEMPLATE` - Tile path template (default: {z}/{x}/{y})
//! - `RASTER_TILER_FORMAT` - Tile format (default: png)
//! - `RASTER_TILER_EXTENSION` - Tile file extension override
//! - `RASTER_TILER_JPEG_QUALITY` - JPEG quality 0-100 (default: 80)
//! - `RASTER_TILER_MEMORY_BUDGET` - Decoder allocation limit in bytes
//! - `RASTER_TILER_THREADS` - Worker threads, 0 for all cores (default: 0)

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::error::ConfigError;
use crate::optimize::{CommandOptimizer, NoOpOptimizer, Optimizer, OptimizerCommand};
use crate::pyramid::{
    TileScheme, TilingConfig, DEFAULT_TEMPLATE, DEFAULT_TILE_SIZE, DEFAULT_ZOOM_MAX,
    DEFAULT_ZOOM_MIN,
};
use crate::raster::{ResampleFilter, ResamplePolicy, DEFAULT_BLUR, DEFAULT_JPEG_QUALITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default padding color.
pub const DEFAULT_FILL_COLOR: &str = "#000000";

/// Default tile format.
pub const DEFAULT_FORMAT: &str = "png";

/// Default worker thread count (all cores).
pub const DEFAULT_THREADS: usize = 0;

// =============================================================================
// CLI Structure
// =============================================================================

/// Raster Tiler - cut a large image into a zoomable tile pyramid.
#[derive(Parser, Debug, Clone)]
#[command(name = "raster-tiler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate the tile pyramid for an image
    Tile(TileArgs),

    /// Print the zoom level plan for an image without writing anything
    Plan(PlanArgs),
}

// =============================================================================
// Tiling Options
// =============================================================================

/// Options shared by every subcommand that needs a tiling configuration.
#[derive(Args, Debug, Clone)]
pub struct TilingArgs {
    // =========================================================================
    // Geometry
    // =========================================================================
    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "RASTER_TILER_TILE_SIZE")]
    pub tile_size: u32,

    /// Lowest zoom level to generate.
    #[arg(long, default_value_t = DEFAULT_ZOOM_MIN, env = "RASTER_TILER_ZOOM_MIN")]
    pub zoom_min: u32,

    /// Highest zoom level to generate.
    #[arg(long, default_value_t = DEFAULT_ZOOM_MAX, env = "RASTER_TILER_ZOOM_MAX")]
    pub zoom_max: u32,

    /// Zoom level at which the source is used at its native resolution.
    ///
    /// Defaults to the highest zoom level.
    #[arg(long, env = "RASTER_TILER_ZOOM_NORMALIZE")]
    pub zoom_normalize: Option<u32>,

    /// Row numbering: xyz (origin top left) or tms (origin bottom left).
    #[arg(long, value_enum, default_value_t = TileScheme::TopLeft, env = "RASTER_TILER_SCHEME")]
    pub scheme: TileScheme,

    /// Padding color for edge tiles: #rgb, #rrggbb, #rrggbbaa or transparent.
    #[arg(long, default_value = DEFAULT_FILL_COLOR, env = "RASTER_TILER_FILL_COLOR")]
    pub fill_color: String,

    // =========================================================================
    // Output
    // =========================================================================
    /// Tile path template relative to the output directory.
    #[arg(long, default_value = DEFAULT_TEMPLATE, env = "RASTER_TILER_TEMPLATE")]
    pub template: String,

    /// Tile format (png, png8, png32, jpeg, jpg, ...).
    #[arg(long, default_value = DEFAULT_FORMAT, env = "RASTER_TILER_FORMAT")]
    pub format: String,

    /// File extension override. Defaults to the extension of the format.
    #[arg(long, env = "RASTER_TILER_EXTENSION")]
    pub extension: Option<String>,

    /// JPEG quality (0-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "RASTER_TILER_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    // =========================================================================
    // Resampling
    // =========================================================================
    /// Use nearest-neighbour scaling above the normalize level.
    #[arg(long, default_value_t = false)]
    pub fast_upsample: bool,

    /// Interpolation filter above the normalize level.
    #[arg(long, value_enum, default_value_t = ResampleFilter::CatmullRom)]
    pub upsample_filter: ResampleFilter,

    /// Blur coefficient above the normalize level (1.0 = none, < 1 sharpens).
    #[arg(long, default_value_t = DEFAULT_BLUR)]
    pub upsample_blur: f32,

    /// Use nearest-neighbour scaling below the normalize level.
    #[arg(long, default_value_t = false)]
    pub fast_downsample: bool,

    /// Interpolation filter below the normalize level.
    #[arg(long, value_enum, default_value_t = ResampleFilter::Lanczos3)]
    pub downsample_filter: ResampleFilter,

    /// Blur coefficient below the normalize level (1.0 = none, < 1 sharpens).
    #[arg(long, default_value_t = DEFAULT_BLUR)]
    pub downsample_blur: f32,

    // =========================================================================
    // Resume and Cleanup
    // =========================================================================
    /// Rebuild level rasters even if they already exist.
    #[arg(long, default_value_t = false, env = "RASTER_TILER_OVERWRITE_BASE_IMAGE")]
    pub overwrite_base_image: bool,

    /// Rewrite tiles even if they already exist.
    #[arg(long, default_value_t = false, env = "RASTER_TILER_OVERWRITE_TILE_IMAGE")]
    pub overwrite_tile_image: bool,

    /// Keep the per-level rasters after tiling.
    #[arg(long, default_value_t = false, env = "RASTER_TILER_KEEP_BASE_IMAGES")]
    pub keep_base_images: bool,

    /// Tile each level straight from memory instead of writing level rasters.
    #[arg(long, default_value_t = false, env = "RASTER_TILER_NO_PERSIST")]
    pub no_persist: bool,

    // =========================================================================
    // Resources
    // =========================================================================
    /// Decoder allocation limit in bytes.
    #[arg(long, env = "RASTER_TILER_MEMORY_BUDGET")]
    pub memory_budget: Option<u64>,

    /// Worker threads for tile generation (0 = all cores).
    #[arg(long, default_value_t = DEFAULT_THREADS, env = "RASTER_TILER_THREADS")]
    pub threads: usize,
}

impl TilingArgs {
    /// Build a validated [`TilingConfig`]. `optimize` is the output
    /// optimization switch, which only the `tile` command exposes.
    pub fn to_tiling_config(&self, optimize: bool) -> Result<TilingConfig, ConfigError> {
        let mut builder = TilingConfig::builder()
            .tile_size(self.tile_size)
            .zoom_range(self.zoom_min, self.zoom_max)
            .tile_scheme(self.scheme)
            .fill_color(self.fill_color.clone())
            .store_path_template(self.template.clone())
            .tile_format(self.format.clone())
            .jpeg_quality(self.jpeg_quality)
            .resample_upsample(self.upsample_policy())
            .resample_downsample(self.downsample_policy())
            .overwrite_base_image(self.overwrite_base_image)
            .overwrite_tile_image(self.overwrite_tile_image)
            .clean_up_base_images(!self.keep_base_images)
            .persist_base_images(!self.no_persist)
            .optimize_output(optimize)
            .memory_budget(self.memory_budget)
            .threads(self.threads);

        if let Some(normalize) = self.zoom_normalize {
            builder = builder.zoom_normalize(normalize);
        }
        if let Some(ref extension) = self.extension {
            builder = builder.tile_extension(extension.clone());
        }

        builder.build()
    }

    fn upsample_policy(&self) -> ResamplePolicy {
        if self.fast_upsample {
            ResamplePolicy::Fast
        } else {
            ResamplePolicy::HighQuality {
                filter: self.upsample_filter,
                blur: self.upsample_blur,
            }
        }
    }

    fn downsample_policy(&self) -> ResamplePolicy {
        if self.fast_downsample {
            ResamplePolicy::Fast
        } else {
            ResamplePolicy::HighQuality {
                filter: self.downsample_filter,
                blur: self.downsample_blur,
            }
        }
    }
}

// =============================================================================
// Tile Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct TileArgs {
    /// Source image (PNG or JPEG).
    pub source: PathBuf,

    /// Output directory. Created if missing.
    pub out: PathBuf,

    #[command(flatten)]
    pub tiling: TilingArgs,

    /// Run the configured optimizer commands on every written tile.
    #[arg(long, default_value_t = false, env = "RASTER_TILER_OPTIMIZE")]
    pub optimize: bool,

    /// Optimizer command for PNG tiles, e.g. "optipng -quiet -o2".
    ///
    /// May be given multiple times; commands run in order.
    #[arg(long = "png-optimizer", value_name = "COMMAND")]
    pub png_optimizers: Vec<OptimizerCommand>,

    /// Optimizer command for JPEG tiles, e.g. "jpegoptim --strip-all -q".
    ///
    /// May be given multiple times; commands run in order.
    #[arg(long = "jpeg-optimizer", value_name = "COMMAND")]
    pub jpeg_optimizers: Vec<OptimizerCommand>,

    /// Print the run report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl TileArgs {
    pub fn to_tiling_config(&self) -> Result<TilingConfig, ConfigError> {
        self.tiling.to_tiling_config(self.optimize)
    }

    /// Optimizer assembled from the `--png-optimizer` and `--jpeg-optimizer`
    /// commands, or a no-op if none were given.
    pub fn optimizer(&self) -> Arc<dyn Optimizer> {
        if self.png_optimizers.is_empty() && self.jpeg_optimizers.is_empty() {
            return Arc::new(NoOpOptimizer);
        }

        let mut optimizer = CommandOptimizer::new();
        for command in &self.png_optimizers {
            optimizer = optimizer.with_png(command.clone());
        }
        for command in &self.jpeg_optimizers {
            optimizer = optimizer.with_jpeg(command.clone());
        }
        Arc::new(optimizer)
    }
}

// =============================================================================
// Plan Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Source image (PNG or JPEG). Only its header is read.
    pub source: PathBuf,

    #[command(flatten)]
    pub tiling: TilingArgs,

    /// Print the plan as JSON on stdout.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl PlanArgs {
    pub fn to_tiling_config(&self) -> Result<TilingConfig, ConfigError> {
        self.tiling.to_tiling_config(false)
    }
}

// =============================================================================
// Tests
// =============================================================================
