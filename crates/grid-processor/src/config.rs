//! Configuration for the grid processor.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GridProcessorError;

/// Resampling method used when a grid changes frame.
///
/// Only `Nearest` can be used with categorical grids; the others exist so
/// that a misconfigured deployment fails at startup with a clear message
/// instead of being silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingMethod {
    #[default]
    Nearest,
    Bilinear,
    Cubic,
}

impl ResamplingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Cubic => "cubic",
        }
    }

    /// Whether output cells are always copies of input cells.
    pub fn preserves_codes(&self) -> bool {
        matches!(self, Self::Nearest)
    }

    /// Reject methods that would blend class codes.
    pub fn ensure_categorical(self) -> Result<Self, GridProcessorError> {
        if self.preserves_codes() {
            Ok(self)
        } else {
            Err(GridProcessorError::BlendingResampling(self.as_str().to_string()))
        }
    }
}

impl FromStr for ResamplingMethod {
    type Err = GridProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" | "near" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "cubic" | "bicubic" => Ok(Self::Cubic),
            other => Err(GridProcessorError::UnknownResampling(other.to_string())),
        }
    }
}

impl std::fmt::Display for ResamplingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for the grid processor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GridProcessorConfig {
    /// Resampling method for reprojection.
    pub resampling: ResamplingMethod,
}

impl GridProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, GridProcessorError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RESAMPLING") {
            config.resampling = val.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GridProcessorError> {
        self.resampling.ensure_categorical().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_methods() {
        assert_eq!("nearest".parse::<ResamplingMethod>().unwrap(), ResamplingMethod::Nearest);
        assert_eq!(" Bilinear ".parse::<ResamplingMethod>().unwrap(), ResamplingMethod::Bilinear);
        assert!("lanczos".parse::<ResamplingMethod>().is_err());
    }

    #[test]
    fn test_blending_methods_rejected() {
        let config = GridProcessorConfig {
            resampling: ResamplingMethod::Bilinear,
        };
        assert!(matches!(
            config.validate(),
            Err(GridProcessorError::BlendingResampling(ref m)) if m == "bilinear"
        ));
        assert!(GridProcessorConfig::default().validate().is_ok());
    }
}
