//! Error types for the analysis pipeline.

use thiserror::Error;

/// Invalid analysis configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} must be positive")]
    NotPositive(&'static str),

    #[error("Raster file template must contain {{year}}: {0}")]
    TemplateWithoutYear(String),

    #[error(transparent)]
    Grid(#[from] grid_processor::GridProcessorError),
}

/// Failure of a text summariser. Never reaches the caller; the pipeline
/// substitutes the fixed fallback text.
#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("Summariser timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Summariser returned status {0}")]
    Status(u16),

    #[error("Summariser response had no text")]
    EmptyResponse,

    #[error("Failed to encode summariser input: {0}")]
    Encode(#[from] serde_json::Error),
}
