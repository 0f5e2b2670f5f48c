//! Land-cover query analysis.
//!
//! Turns a query (intent, categories, one or two years) into area
//! statistics, rendered visualizations and a narrative:
//!
//! - [`metrics`]: per-category pixel counts and areas
//! - [`registry`]: which visualizations each intent draws
//! - [`dispatcher`]: visualization specs and their renderers
//! - [`summarizer`]: template narrative and optional external prose
//! - [`orchestrator`]: the pipeline tying them together
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use analysis::{AnalysisConfig, QueryOrchestrator};
//! use geotiff_reader::GeoTiffDirectory;
//! use landcover_common::{Catalog, Query};
//!
//! # async fn run() {
//! let orchestrator = QueryOrchestrator::new(
//!     Arc::new(Catalog::builtin()),
//!     Arc::new(GeoTiffDirectory::new("data")),
//!     AnalysisConfig::default(),
//! );
//! let query = Query::new("trend_analysis", vec!["grasslands".into()], vec![2015, 2020]);
//! let result = orchestrator.handle(&query).await;
//! println!("{}", result.text);
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod summarizer;
pub mod validation;

pub use config::{AnalysisConfig, DEFAULT_PIXEL_AREA_KM2};
pub use dispatcher::{Artifact, MapLayer, VisualizationDispatcher, VisualizationSpec};
pub use error::{ConfigError, SummarizerError};
pub use metrics::{CategoryMetrics, MetricsEngine, MetricsTable, YearMetrics};
pub use orchestrator::{Analysis, QueryOrchestrator};
pub use registry::{IntentPlan, IntentRegistry};
pub use summarizer::{HttpSummarizer, TemplateSummarizer, TextSummarizer, FALLBACK_SUMMARY};
pub use validation::validate_query;
