use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline phase in which a run-level error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    BuildingLevels,
    Tiling,
    CleaningUp,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validating => "validating",
            Phase::BuildingLevels => "building levels",
            Phase::Tiling => "tiling",
            Phase::CleaningUp => "cleaning up",
        };
        f.write_str(name)
    }
}

/// Errors related to the tile output format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// No known extension mapping for the requested format
    #[error("Unsupported tile format: {format} (expected a png or jpeg variant)")]
    UnsupportedFormat { format: String },
}

/// Errors raised while building a [`TilingConfig`](crate::pyramid::TilingConfig).
///
/// All of these are detected before any filesystem access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Tile size must be positive
    #[error("tile_size must be greater than 0")]
    InvalidTileSize,

    /// Minimum zoom is above maximum zoom
    #[error("zoom_min ({min}) must not exceed zoom_max ({max})")]
    InvalidZoomRange { min: u32, max: u32 },

    /// Normalize zoom lies outside the zoom range
    #[error("zoom_normalize ({normalize}) must lie within {min}..={max}")]
    NormalizeOutOfRange { normalize: u32, min: u32, max: u32 },

    /// Zoom levels so far apart that a scale factor would overflow
    #[error("zoom span {span} is too large (maximum {max})")]
    ZoomSpanTooLarge { span: u32, max: u32 },

    /// JPEG quality outside 0-100
    #[error("jpeg_quality must be between 0 and 100, got {0}")]
    InvalidJpegQuality(u8),

    /// Blur coefficient must be a positive finite number
    #[error("resample blur must be a positive finite number, got {0}")]
    InvalidBlur(String),

    /// Fill color could not be parsed
    #[error("Invalid fill color: {value}")]
    InvalidFillColor { value: String },

    /// Fill color carries transparency the output format cannot store
    #[error("fill color {value} is translucent but {format} tiles have no alpha channel")]
    TranslucentFill { value: String, format: String },

    /// Store path template is unusable
    #[error("Invalid store path template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Tile extension override is empty or contains a path separator
    #[error("Invalid tile extension: {0:?}")]
    InvalidExtension(String),

    /// Unknown tile format
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Errors reported by the image backend
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Source data could not be opened or decoded
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Resampling failed
    #[error("Resample error: {message}")]
    Resample { message: String },

    /// Target raster exceeds what the backend can address
    #[error("Raster of {width}x{height} exceeds backend limits")]
    DimensionsTooLarge { width: u64, height: u64 },

    /// Encoding to the tile format failed
    #[error("Encode error: {message}")]
    Encode { message: String },

    /// Required codec is not available
    #[error("Image backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort a tiling run.
///
/// Every variant is fatal to the current run; there is no internal retry.
#[derive(Debug, Error)]
pub enum TilerError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Source image missing, unreadable, or undecodable
    #[error("Cannot read source image {path}: {message}")]
    Input { path: PathBuf, message: String },

    /// Destination not writable or not creatable
    #[error("Output error while {phase} at {path}: {message}")]
    Output {
        phase: Phase,
        path: PathBuf,
        message: String,
    },

    /// A persisted level raster disappeared between building and tiling
    #[error("Base image for zoom level {zoom} is missing or unreadable: {path}")]
    Consistency { zoom: u32, path: PathBuf },

    /// Resampling a zoom level failed
    #[error("Failed to build zoom level {zoom}: {source}")]
    Resample {
        zoom: u32,
        #[source]
        source: BackendError,
    },

    /// A level resolved to a zero-sized raster
    #[error("Zoom level {zoom} resolves to an empty raster ({width}x{height})")]
    EmptyLevel { zoom: u32, width: u64, height: u64 },

    /// Encoding or writing a raster failed
    #[error("Write failed while {phase} (zoom {zoom}) at {path}: {message}")]
    BackendWrite {
        phase: Phase,
        zoom: u32,
        path: PathBuf,
        message: String,
    },

    /// The image backend cannot serve the configured format
    #[error("Image backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The tile worker pool could not be started
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

impl TilerError {
    /// Phase of the pipeline this error belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            TilerError::Config(_)
            | TilerError::Input { .. }
            | TilerError::BackendUnavailable(_)
            | TilerError::WorkerPool(_)
            | TilerError::EmptyLevel { .. } => Phase::Validating,
            TilerError::Resample { .. } => Phase::BuildingLevels,
            TilerError::Consistency { .. } => Phase::Tiling,
            TilerError::Output { phase, .. } | TilerError::BackendWrite { phase, .. } => *phase,
        }
    }
}
