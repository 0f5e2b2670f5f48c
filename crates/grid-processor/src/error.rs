//! Error types for grid processing.

use thiserror::Error;

/// Errors that can occur during grid processing.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Grid buffer length does not match its dimensions.
    #[error("grid buffer holds {actual} cells, expected {width}x{height}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        actual: usize,
    },

    /// The requested resampling method would blend category codes.
    #[error("resampling method '{0}' blends values and cannot be used on categorical data")]
    BlendingResampling(String),

    /// Unrecognised resampling method name.
    #[error("unknown resampling method: {0}")]
    UnknownResampling(String),

    /// Projection error.
    #[error("projection error: {0}")]
    ProjectionError(String),

    /// The geotransform cannot be inverted.
    #[error("geotransform is not invertible")]
    DegenerateTransform,

    /// No grid edge point could be projected to geographic coordinates.
    #[error("grid has no geographic footprint")]
    EmptyFootprint,
}

impl From<projection::ProjectionError> for GridProcessorError {
    fn from(err: projection::ProjectionError) -> Self {
        Self::ProjectionError(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
