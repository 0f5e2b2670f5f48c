//! Analysis intents and the visualization kinds they produce.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of analysis goals a query may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisIntent {
    TrendAnalysis,
    SpatialDistribution,
    ChangeDetection,
    Comparison,
    StatisticalSummary,
}

impl AnalysisIntent {
    pub const ALL: [AnalysisIntent; 5] = [
        AnalysisIntent::TrendAnalysis,
        AnalysisIntent::SpatialDistribution,
        AnalysisIntent::ChangeDetection,
        AnalysisIntent::Comparison,
        AnalysisIntent::StatisticalSummary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisIntent::TrendAnalysis => "trend_analysis",
            AnalysisIntent::SpatialDistribution => "spatial_distribution",
            AnalysisIntent::ChangeDetection => "change_detection",
            AnalysisIntent::Comparison => "comparison",
            AnalysisIntent::StatisticalSummary => "statistical_summary",
        }
    }

    /// Human-readable label used in narratives and the config endpoint.
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisIntent::TrendAnalysis => "Trend Analysis",
            AnalysisIntent::SpatialDistribution => "Spatial Distribution",
            AnalysisIntent::ChangeDetection => "Change Detection",
            AnalysisIntent::Comparison => "Comparison",
            AnalysisIntent::StatisticalSummary => "Statistical Summary",
        }
    }
}

impl fmt::Display for AnalysisIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        AnalysisIntent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

/// Kinds of rendered output an intent can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    LineChart,
    BarChart,
    PieChart,
    ChoroplethMap,
    #[serde(alias = "map")]
    OverlayMap,
    ChangeMap,
    SideBySideMaps,
}

impl VisualizationKind {
    pub const ALL: [VisualizationKind; 7] = [
        VisualizationKind::LineChart,
        VisualizationKind::BarChart,
        VisualizationKind::PieChart,
        VisualizationKind::ChoroplethMap,
        VisualizationKind::OverlayMap,
        VisualizationKind::ChangeMap,
        VisualizationKind::SideBySideMaps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationKind::LineChart => "line_chart",
            VisualizationKind::BarChart => "bar_chart",
            VisualizationKind::PieChart => "pie_chart",
            VisualizationKind::ChoroplethMap => "choropleth_map",
            VisualizationKind::OverlayMap => "overlay_map",
            VisualizationKind::ChangeMap => "change_map",
            VisualizationKind::SideBySideMaps => "side_by_side_maps",
        }
    }

    /// Whether the renderer needs raster frames rather than just metrics.
    pub fn needs_rasters(&self) -> bool {
        matches!(
            self,
            VisualizationKind::ChoroplethMap
                | VisualizationKind::OverlayMap
                | VisualizationKind::ChangeMap
                | VisualizationKind::SideBySideMaps
        )
    }
}

impl fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualizationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized == "map" {
            return Ok(VisualizationKind::OverlayMap);
        }
        VisualizationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}
