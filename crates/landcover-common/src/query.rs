//! Query and result types exchanged with callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnalysisIntent, BoundingBox, Category, VisualizationKind};

/// A query as received from the request layer, before semantic validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    /// Raw intent identifier, e.g. "spatial_distribution"
    pub intent: String,
    /// Category names, primary variable first
    pub variables: Vec<String>,
    /// One or two years
    pub years: Vec<i32>,
    /// Free-text comment passed to the summariser
    pub comment: Option<String>,
}

impl Query {
    pub fn new(
        intent: impl Into<String>,
        variables: Vec<String>,
        years: Vec<i32>,
    ) -> Self {
        Self {
            intent: intent.into(),
            variables,
            years,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A query that passed validation against the catalog and intent registry.
#[derive(Debug, Clone)]
pub struct ValidatedQuery {
    pub intent: AnalysisIntent,
    /// Resolved categories, primary first
    pub categories: Vec<Category>,
    /// Years in request order
    pub years: Vec<i32>,
    pub comment: Option<String>,
}

impl ValidatedQuery {
    /// The category captions and titles refer to.
    pub fn primary(&self) -> &Category {
        // Validation guarantees at least one category.
        &self.categories[0]
    }
}

/// Where an overlay image sits on a WGS84 basemap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPlacement {
    /// Image extent in degrees
    pub bounds: BoundingBox,
    pub center_lon: f64,
    pub center_lat: f64,
    /// Suggested initial zoom level for a web map
    pub zoom: u8,
}

/// Metadata describing one rendered artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDetails {
    pub kind: VisualizationKind,
    pub title: String,
    pub media_type: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<MapPlacement>,
}

/// The response returned for every query.
///
/// `images`, `captions` and `details` are aligned index by index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub text: String,
    /// Base64-encoded PNG images
    pub images: Vec<String>,
    pub captions: Vec<String>,
    pub details: Vec<ArtifactDetails>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// A response carrying only a message, e.g. after a validation failure.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
            captions: Vec::new(),
            details: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}
