//! Common types and utilities shared across the land-cover query workspace.

pub mod bbox;
pub mod catalog;
pub mod category;
pub mod crs;
pub mod error;
pub mod geotransform;
pub mod intent;
pub mod query;

pub use bbox::BoundingBox;
pub use catalog::{Catalog, IntentOption, VariableOption};
pub use category::{Category, NO_DATA_CODE};
pub use crs::{CrsCode, SinusoidalParams};
pub use error::{CatalogError, QueryError};
pub use geotransform::GeoTransform;
pub use intent::{AnalysisIntent, VisualizationKind};
pub use query::{AnalysisResult, ArtifactDetails, MapPlacement, Query, ValidatedQuery};
