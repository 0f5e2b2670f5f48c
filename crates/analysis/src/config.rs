//! Analysis pipeline configuration.

use std::time::Duration;

use grid_processor::{GridProcessorConfig, ResamplingMethod};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use geotiff_reader::{DEFAULT_FILE_TEMPLATE, DEFAULT_MAX_DECODE_BYTES, YEAR_PLACEHOLDER};

/// Area of one raster cell: a nominal 500 m x 500 m pixel.
pub const DEFAULT_PIXEL_AREA_KM2: f64 = 0.25;

/// Longest side of an overlay image before stride downsampling.
pub const DEFAULT_MAX_OVERLAY_DIM: usize = 1024;

/// Longest side of a panel embedded in a static map figure.
pub const DEFAULT_MAX_MAP_DIM: usize = 800;

pub const DEFAULT_SUMMARIZER_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`crate::QueryOrchestrator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// km² represented by one cell, independent of raster resolution
    pub pixel_area_km2: f64,
    pub max_overlay_dim: usize,
    pub max_map_dim: usize,
    /// Per-year file name, `{year}` is substituted
    pub raster_file_template: String,
    /// Largest decoded sample buffer accepted from one raster file
    pub max_decode_bytes: usize,
    pub resampling: ResamplingMethod,
    #[serde(with = "duration_secs")]
    pub summarizer_timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pixel_area_km2: DEFAULT_PIXEL_AREA_KM2,
            max_overlay_dim: DEFAULT_MAX_OVERLAY_DIM,
            max_map_dim: DEFAULT_MAX_MAP_DIM,
            raster_file_template: DEFAULT_FILE_TEMPLATE.to_string(),
            max_decode_bytes: DEFAULT_MAX_DECODE_BYTES,
            resampling: ResamplingMethod::Nearest,
            summarizer_timeout: DEFAULT_SUMMARIZER_TIMEOUT,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}

impl AnalysisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(area) = parse_env("PIXEL_AREA_KM2")? {
            config.pixel_area_km2 = area;
        }
        if let Some(dim) = parse_env("MAX_OVERLAY_DIM")? {
            config.max_overlay_dim = dim;
        }
        if let Some(dim) = parse_env("MAX_MAP_DIM")? {
            config.max_map_dim = dim;
        }
        if let Ok(template) = std::env::var("RASTER_FILE_TEMPLATE") {
            config.raster_file_template = template;
        }
        if let Some(bytes) = parse_env("MAX_DECODE_BYTES")? {
            config.max_decode_bytes = bytes;
        }
        if let Some(secs) = parse_env::<u64>("SUMMARIZER_TIMEOUT_SECS")? {
            config.summarizer_timeout = Duration::from_secs(secs);
        }
        config.resampling = GridProcessorConfig::from_env()?.resampling;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pixel_area_km2.is_finite() && self.pixel_area_km2 > 0.0) {
            return Err(ConfigError::NotPositive("PIXEL_AREA_KM2"));
        }
        if self.max_overlay_dim == 0 {
            return Err(ConfigError::NotPositive("MAX_OVERLAY_DIM"));
        }
        if self.max_map_dim == 0 {
            return Err(ConfigError::NotPositive("MAX_MAP_DIM"));
        }
        if self.max_decode_bytes == 0 {
            return Err(ConfigError::NotPositive("MAX_DECODE_BYTES"));
        }
        if self.summarizer_timeout.is_zero() {
            return Err(ConfigError::NotPositive("SUMMARIZER_TIMEOUT_SECS"));
        }
        if !self.raster_file_template.contains(YEAR_PLACEHOLDER) {
            return Err(ConfigError::TemplateWithoutYear(
                self.raster_file_template.clone(),
            ));
        }
        self.resampling.ensure_categorical()?;
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.pixel_area_km2, 0.25);
        assert_eq!(config.raster_file_template, "LC_Type1_{year}.tif");
        assert_eq!(config.max_decode_bytes, 1 << 30);
    }

    #[test]
    fn test_rejects_blending_resampling() {
        let config = AnalysisConfig {
            resampling: ResamplingMethod::Cubic,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Grid(_))));
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = AnalysisConfig {
            pixel_area_km2: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            max_decode_bytes: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive("MAX_DECODE_BYTES"))
        ));

        let config = AnalysisConfig {
            raster_file_template: "landcover.tif".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TemplateWithoutYear(_))
        ));
    }
}
