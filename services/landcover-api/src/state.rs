//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use analysis::QueryOrchestrator;
use anyhow::Result;
use geotiff_reader::GeoTiffDirectory;
use landcover_common::Catalog;

use crate::config::ServiceConfig;

/// State shared by all handlers; read-only after startup.
pub struct AppState {
    pub orchestrator: QueryOrchestrator,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let catalog = Arc::new(config.load_catalog()?);
        let mut state = Self::with_catalog(config, catalog);
        if let Some(settings) = &config.summarizer {
            let summarizer = settings.build(config.analysis.summarizer_timeout)?;
            state.orchestrator = state.orchestrator.with_summarizer(summarizer);
            tracing::info!(
                url = %settings.url,
                model = %settings.model,
                "External summariser enabled"
            );
        }
        Ok(state)
    }

    /// State over an already loaded catalog, without external summariser.
    pub fn with_catalog(config: &ServiceConfig, catalog: Arc<Catalog>) -> Self {
        let source = GeoTiffDirectory::new(&config.data_dir)
            .with_template(config.analysis.raster_file_template.clone())
            .with_max_decode_bytes(config.analysis.max_decode_bytes);
        Self {
            orchestrator: QueryOrchestrator::new(
                catalog,
                Arc::new(source),
                config.analysis.clone(),
            ),
            data_dir: config.data_dir.clone(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.orchestrator.catalog()
    }
}
