//! Service configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use analysis::{AnalysisConfig, HttpSummarizer, TextSummarizer};
use anyhow::{Context, Result};
use landcover_common::Catalog;
use tracing::info;

pub const DEFAULT_SUMMARIZER_MODEL: &str = "gpt-4o-mini";

/// External summariser endpoint, enabled when `SUMMARIZER_URL` is set.
#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl SummarizerSettings {
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUMMARIZER_URL").ok().filter(|u| !u.trim().is_empty())?;
        Some(Self {
            url,
            api_key: std::env::var("SUMMARIZER_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("SUMMARIZER_MODEL")
                .unwrap_or_else(|_| DEFAULT_SUMMARIZER_MODEL.to_string()),
        })
    }

    pub fn build(&self, timeout: Duration) -> Result<Arc<dyn TextSummarizer>> {
        let summarizer = HttpSummarizer::new(&self.url, self.api_key.clone(), &self.model, timeout)
            .context("Failed to build summariser HTTP client")?;
        Ok(Arc::new(summarizer))
    }
}

/// Everything the service needs at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding the per-year rasters
    pub data_dir: PathBuf,
    /// YAML catalog replacing the built-in tables
    pub catalog_path: Option<PathBuf>,
    pub analysis: AnalysisConfig,
    pub summarizer: Option<SummarizerSettings>,
}

impl ServiceConfig {
    /// Combine command-line paths with environment settings.
    pub fn from_env(data_dir: PathBuf, catalog_path: Option<PathBuf>) -> Result<Self> {
        let analysis = AnalysisConfig::from_env().context("Invalid analysis configuration")?;
        Ok(Self {
            data_dir,
            catalog_path,
            analysis,
            summarizer: SummarizerSettings::from_env(),
        })
    }

    /// Load and validate the catalog once.
    pub fn load_catalog(&self) -> Result<Catalog> {
        let catalog = match &self.catalog_path {
            Some(path) => Catalog::load(path)
                .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
            None => Catalog::builtin(),
        };
        catalog.validate().context("Invalid catalog")?;
        info!(
            categories = catalog.categories.len(),
            intents = catalog.intents.len(),
            years = catalog.years.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }
}
