//! Intent Registry: which visualizations each analysis intent produces.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use landcover_common::{AnalysisIntent, VisualizationKind};

/// What an intent draws and what it expects from a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentPlan {
    pub intent: AnalysisIntent,
    /// Visualizations in output order
    pub visualizations: Vec<VisualizationKind>,
    /// Number of years the intent is meaningful for
    pub years: RangeInclusive<usize>,
}

/// Static intent to visualization mapping, read-only once built.
#[derive(Debug, Clone)]
pub struct IntentRegistry {
    plans: HashMap<AnalysisIntent, IntentPlan>,
}

impl Default for IntentRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl IntentRegistry {
    /// The five supported intents.
    pub fn standard() -> Self {
        use VisualizationKind::*;

        let plans = [
            (AnalysisIntent::TrendAnalysis, vec![LineChart], 1..=2),
            (
                AnalysisIntent::SpatialDistribution,
                vec![ChoroplethMap, OverlayMap],
                1..=2,
            ),
            (AnalysisIntent::ChangeDetection, vec![ChangeMap, BarChart], 2..=2),
            (AnalysisIntent::Comparison, vec![SideBySideMaps, BarChart], 1..=2),
            (AnalysisIntent::StatisticalSummary, vec![PieChart], 1..=2),
        ]
        .into_iter()
        .map(|(intent, visualizations, years)| {
            (
                intent,
                IntentPlan {
                    intent,
                    visualizations,
                    years,
                },
            )
        })
        .collect();

        Self { plans }
    }

    /// Ordered visualization kinds for an intent identifier. Unknown
    /// identifiers resolve to an empty list.
    pub fn resolve(&self, intent: &str) -> Vec<VisualizationKind> {
        intent
            .parse::<AnalysisIntent>()
            .ok()
            .and_then(|i| self.plan(i))
            .map(|p| p.visualizations.clone())
            .unwrap_or_default()
    }

    pub fn plan(&self, intent: AnalysisIntent) -> Option<&IntentPlan> {
        self.plans.get(&intent)
    }

    pub fn is_registered(&self, intent: AnalysisIntent) -> bool {
        self.plans.contains_key(&intent)
    }

    /// Registered intents in declaration order.
    pub fn intents(&self) -> Vec<AnalysisIntent> {
        AnalysisIntent::ALL
            .into_iter()
            .filter(|i| self.is_registered(*i))
            .collect()
    }
}
