//! Error types for raster reading.

use std::path::PathBuf;

use grid_processor::GridProcessorError;
use thiserror::Error;

/// Result type for raster reader operations.
pub type RasterResult<T> = Result<T, RasterError>;

/// Error types for raster reading.
#[derive(Error, Debug)]
pub enum RasterError {
    /// No file exists for the requested year
    #[error("Raster not found for year {year}: {}", path.display())]
    NotFound { year: i32, path: PathBuf },

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF container could not be decoded
    #[error("GeoTIFF decode error: {0}")]
    Decode(#[from] tiff::TiffError),

    /// Pixel layout the reader does not handle (multi-band, float, ...)
    #[error("Unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    /// Decoded samples would exceed the configured buffer budget
    #[error("Raster of {width}x{height} exceeds the {limit} byte decoding limit")]
    TooLarge { width: u32, height: u32, limit: usize },

    /// Neither tiepoint/scale nor a model transformation is present
    #[error("Missing georeferencing in {}", .0.display())]
    MissingGeoreference(PathBuf),

    /// Malformed GeoKey directory
    #[error("Invalid GeoKey directory: {0}")]
    InvalidGeoKeys(String),

    /// Decoded buffer does not form a valid grid
    #[error("Invalid grid: {0}")]
    Grid(#[from] GridProcessorError),

    /// Reprojection to the display CRS failed
    #[error("Reprojection failed: {0}")]
    Projection(String),
}

impl RasterError {
    /// Whether this error means the year simply has no raster.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RasterError::NotFound { .. })
    }
}
