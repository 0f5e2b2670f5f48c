//! Query Orchestrator: the single entry point from a raw [`Query`] to an
//! [`AnalysisResult`].
//!
//! Validate, acquire rasters, measure, plan, render, summarise, assemble.
//! Validation failures short-circuit before any raster is read; a missing
//! year only removes that year's data; a failed render only removes that
//! artifact. Every path ends in a result with a `text`.

use std::sync::Arc;
use std::time::Instant;

use geotiff_reader::{RasterFrame, RasterSource};
use landcover_common::{
    AnalysisResult, Catalog, Query, QueryError, ValidatedQuery, VisualizationKind,
};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::config::AnalysisConfig;
use crate::dispatcher::{
    plan_visualization, Artifact, MapLayer, PlanContext, VisualizationDispatcher, VisualizationSpec,
};
use crate::metrics::{MetricsEngine, MetricsTable, YearMetrics};
use crate::registry::IntentRegistry;
use crate::summarizer::{summarize_or_fallback, SummaryRequest, TemplateSummarizer, TextSummarizer};
use crate::validation::validate_query;

/// Shown when the analysis task itself could not complete.
pub const INTERNAL_ERROR_TEXT: &str = "The analysis could not be completed. Please try again.";

/// Everything computed for a validated query before summarising.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub query: ValidatedQuery,
    pub metrics: MetricsTable,
    /// Planned visualization kinds, in registry order
    pub plan: Vec<VisualizationKind>,
    pub specs: Vec<VisualizationSpec>,
    pub artifacts: Vec<Artifact>,
}

struct Inner {
    catalog: Arc<Catalog>,
    registry: IntentRegistry,
    source: Arc<dyn RasterSource>,
    engine: MetricsEngine,
    dispatcher: VisualizationDispatcher,
    config: AnalysisConfig,
    summarizer: Option<Arc<dyn TextSummarizer>>,
}

/// Cheap to clone; clones share the catalog, source and summariser.
#[derive(Clone)]
pub struct QueryOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for QueryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOrchestrator")
            .field("config", &self.inner.config)
            .field("summarizer", &self.inner.summarizer.is_some())
            .finish_non_exhaustive()
    }
}

impl QueryOrchestrator {
    pub fn new(
        catalog: Arc<Catalog>,
        source: Arc<dyn RasterSource>,
        config: AnalysisConfig,
    ) -> Self {
        Self::build(catalog, source, config, IntentRegistry::standard(), None)
    }

    fn build(
        catalog: Arc<Catalog>,
        source: Arc<dyn RasterSource>,
        config: AnalysisConfig,
        registry: IntentRegistry,
        summarizer: Option<Arc<dyn TextSummarizer>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                registry,
                source,
                engine: MetricsEngine::new(config.pixel_area_km2),
                dispatcher: VisualizationDispatcher,
                config,
                summarizer,
            }),
        }
    }

    /// Attach an external summariser whose prose follows the narrative.
    pub fn with_summarizer(self, summarizer: Arc<dyn TextSummarizer>) -> Self {
        self.rebuild(|_, s| *s = Some(summarizer))
    }

    pub fn with_registry(self, registry: IntentRegistry) -> Self {
        self.rebuild(|r, _| *r = registry)
    }

    fn rebuild(
        self,
        change: impl FnOnce(&mut IntentRegistry, &mut Option<Arc<dyn TextSummarizer>>),
    ) -> Self {
        let inner = &self.inner;
        let mut registry = inner.registry.clone();
        let mut summarizer = inner.summarizer.clone();
        change(&mut registry, &mut summarizer);
        Self::build(
            inner.catalog.clone(),
            inner.source.clone(),
            inner.config.clone(),
            registry,
            summarizer,
        )
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.inner.config
    }

    /// Semantic validation against the catalog and registry.
    pub fn validate(&self, query: &Query) -> Result<ValidatedQuery, QueryError> {
        validate_query(query, &self.inner.catalog, &self.inner.registry)
    }

    /// Read every requested year in parallel, in request order. Absent or
    /// unreadable rasters come back as `None`.
    fn acquire(&self, years: &[i32]) -> Vec<(i32, Option<RasterFrame>)> {
        years
            .par_iter()
            .map(|&year| match self.inner.source.read(year) {
                Ok(frame) => (year, Some(frame)),
                Err(e) => {
                    if e.is_not_found() {
                        warn!(year, error = %e, "Raster not found");
                    } else {
                        warn!(year, error = %e, "Raster could not be read");
                    }
                    ::metrics::counter!("landcover_missing_rasters_total").increment(1);
                    (year, None)
                }
            })
            .collect()
    }

    /// Display grids for map renderers, ascending by year. Reprojection
    /// failures fall back to the native grid.
    fn display_layers(&self, frames: &[&RasterFrame]) -> Vec<MapLayer> {
        let mut layers: Vec<MapLayer> = frames
            .par_iter()
            .map(|frame| {
                let grid = match frame.to_wgs84(self.inner.config.resampling) {
                    Ok(display) => display.grid,
                    Err(e) => {
                        warn!(
                            year = frame.year,
                            crs = %frame.crs(),
                            error = %e,
                            "Reprojection failed; mapping native grid"
                        );
                        frame.grid.clone()
                    }
                };
                MapLayer {
                    year: frame.year,
                    grid,
                }
            })
            .collect();
        layers.sort_by_key(|layer| layer.year);
        layers
    }

    /// Acquire, measure, plan and render for an already validated query.
    pub fn analyze(&self, query: ValidatedQuery) -> Analysis {
        let acquired = self.acquire(&query.years);

        let metrics = MetricsTable::new(
            acquired
                .iter()
                .map(|(year, frame)| match frame {
                    Some(frame) => self.inner.engine.measure_year(frame, &query.categories),
                    None => YearMetrics::Missing { year: *year },
                })
                .collect(),
        );

        let plan = self
            .inner
            .registry
            .plan(query.intent)
            .map(|p| p.visualizations.clone())
            .unwrap_or_default();

        let specs = if metrics.all_missing() {
            Vec::new()
        } else {
            let frames: Vec<&RasterFrame> =
                acquired.iter().filter_map(|(_, f)| f.as_ref()).collect();
            let layers = if plan.iter().any(VisualizationKind::needs_rasters) {
                self.display_layers(&frames)
            } else {
                Vec::new()
            };
            let ctx = PlanContext {
                categories: &query.categories,
                metrics: &metrics,
                layers: &layers,
                pixel_area_km2: self.inner.engine.pixel_area_km2(),
                max_map_dim: self.inner.config.max_map_dim,
                max_overlay_dim: self.inner.config.max_overlay_dim,
            };
            plan.iter()
                .flat_map(|kind| plan_visualization(*kind, &ctx))
                .collect()
        };

        let artifacts = self.inner.dispatcher.render_all(&specs);

        Analysis {
            query,
            metrics,
            plan,
            specs,
            artifacts,
        }
    }

    /// Answer a query. Never fails: validation problems and internal
    /// errors become the response text.
    #[instrument(skip(self, query), fields(intent = %query.intent, years = ?query.years))]
    pub async fn handle(&self, query: &Query) -> AnalysisResult {
        let started = Instant::now();
        ::metrics::counter!("landcover_requests_total").increment(1);

        let validated = match self.validate(query) {
            Ok(v) => v,
            Err(e) => {
                info!(reason = e.code(), "Query rejected");
                ::metrics::counter!("landcover_validation_failures_total", "reason" => e.code())
                    .increment(1);
                return AnalysisResult::text_only(e.user_message());
            }
        };

        let this = self.clone();
        let analysis = match tokio::task::spawn_blocking(move || this.analyze(validated)).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::error!(error = %e, "Analysis task failed");
                return AnalysisResult::text_only(INTERNAL_ERROR_TEXT);
            }
        };

        let result = self.assemble(&analysis).await;
        ::metrics::histogram!("landcover_request_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        info!(
            images = result.images.len(),
            missing = analysis.metrics.missing_years().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query answered"
        );
        result
    }

    async fn assemble(&self, analysis: &Analysis) -> AnalysisResult {
        let mut text = TemplateSummarizer.narrative(&analysis.query, &analysis.metrics);

        if let Some(summarizer) = &self.inner.summarizer {
            if !analysis.metrics.all_missing() {
                let request = SummaryRequest::new(
                    &analysis.query,
                    &analysis.metrics,
                    analysis.plan.clone(),
                );
                let timeout = self.inner.config.summarizer_timeout;
                let prose = summarize_or_fallback(summarizer.as_ref(), &request, timeout).await;
                text.push_str("\n\n");
                text.push_str(&prose);
            }
        }

        let variable = &analysis.query.primary().name;
        let mut result = AnalysisResult::text_only(text);
        for artifact in &analysis.artifacts {
            result.images.push(artifact.image.to_base64());
            result
                .captions
                .push(self.inner.catalog.caption_for(artifact.kind, variable));
            result.details.push(artifact.details());
        }
        result
    }
}
