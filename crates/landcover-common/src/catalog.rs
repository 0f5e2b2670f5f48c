//! Process-wide configuration catalog.
//!
//! Holds the closed sets a query is validated against: land-cover
//! categories, enabled intents, advertised years and caption templates per
//! visualization kind. Built once at startup (from the built-in tables or a
//! YAML file) and shared read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

use crate::{AnalysisIntent, Category, CatalogError, VisualizationKind};

/// Placeholder substituted with the primary variable name in captions.
pub const VARIABLE_PLACEHOLDER: &str = "{variable}";

/// Land-cover classes of the MODIS LC_Type1 (IGBP) legend.
const BUILTIN_CATEGORIES: &[(u8, &str, &str)] = &[
    (1, "evergreen_needleleaf_forest", "Evergreen Needleleaf Forest"),
    (2, "evergreen_broadleaf_forest", "Evergreen Broadleaf Forest"),
    (3, "deciduous_needleleaf_forest", "Deciduous Needleleaf Forest"),
    (4, "deciduous_broadleaf_forest", "Deciduous Broadleaf Forest"),
    (5, "mixed_forests", "Mixed Forests"),
    (6, "closed_shrublands", "Closed Shrublands"),
    (7, "open_shrublands", "Open Shrublands"),
    (8, "woody_savannas", "Woody Savannas"),
    (9, "savannas", "Savannas"),
    (10, "grasslands", "Grasslands"),
    (11, "permanent_wetlands", "Permanent Wetlands"),
    (12, "croplands", "Croplands"),
    (13, "urban_and_built_up_lands", "Urban and Built-up Lands"),
    (14, "cropland_natural_vegetation", "Cropland/Natural Vegetation"),
    (15, "snow_and_ice", "Snow and Ice"),
    (16, "barren_or_sparsely_vegetated", "Barren or Sparsely Vegetated"),
    (255, "no_data", "No Data"),
];

/// An intent offered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentOption {
    pub value: AnalysisIntent,
    pub label: String,
}

/// A variable (category) offered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableOption {
    pub value: String,
    pub label: String,
}

/// Immutable catalog of categories, intents, years and captions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
    #[serde(default = "default_intents")]
    pub intents: Vec<IntentOption>,
    #[serde(default = "default_years")]
    pub years: Vec<i32>,
    #[serde(default = "default_captions")]
    pub captions: HashMap<VisualizationKind, String>,
}

fn default_intents() -> Vec<IntentOption> {
    AnalysisIntent::ALL
        .into_iter()
        .map(|intent| IntentOption {
            value: intent,
            label: intent.label().to_string(),
        })
        .collect()
}

fn default_years() -> Vec<i32> {
    (2011..=2020).collect()
}

fn default_captions() -> HashMap<VisualizationKind, String> {
    [
        (VisualizationKind::LineChart, "Trend of {variable} over the selected years."),
        (
            VisualizationKind::ChoroplethMap,
            "Spatial distribution of {variable} in the selected region and year.",
        ),
        (
            VisualizationKind::OverlayMap,
            "Interactive map overlay of {variable} for the selected year.",
        ),
        (
            VisualizationKind::ChangeMap,
            "Change detection map showing differences in {variable} between selected years.",
        ),
        (
            VisualizationKind::BarChart,
            "Comparison of {variable} across selected years or regions.",
        ),
        (
            VisualizationKind::SideBySideMaps,
            "Side-by-side maps comparing spatial distribution of {variable} for the selected years.",
        ),
        (
            VisualizationKind::PieChart,
            "Statistical summary of {variable} for the selected year.",
        ),
    ]
    .into_iter()
    .map(|(kind, caption)| (kind, caption.to_string()))
    .collect()
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The built-in catalog (IGBP legend, all intents, 2011-2020).
    pub fn builtin() -> Self {
        Self {
            categories: BUILTIN_CATEGORIES
                .iter()
                .map(|&(code, name, label)| Category::new(code, name, label))
                .collect(),
            intents: default_intents(),
            years: default_years(),
            captions: default_captions(),
        }
    }

    /// Parse and validate a catalog from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&content)?;
        info!(
            path = %path.display(),
            categories = catalog.categories.len(),
            intents = catalog.intents.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Check that category codes and names are unique.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.categories.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut codes = HashSet::new();
        let mut names = HashSet::new();
        for category in &self.categories {
            if !codes.insert(category.code) {
                return Err(CatalogError::DuplicateCode(category.code));
            }
            if !names.insert(category.name.to_lowercase()) {
                return Err(CatalogError::DuplicateName(category.name.clone()));
            }
        }
        Ok(())
    }

    /// Look up a category by name (case-insensitive, surrounding whitespace ignored).
    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        let wanted = name.trim().to_lowercase();
        self.categories.iter().find(|c| c.name == wanted)
    }

    /// Look up a category by raster code.
    pub fn category_by_code(&self, code: u8) -> Option<&Category> {
        self.categories.iter().find(|c| c.code == code)
    }

    /// Names of all categories, in catalog order.
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    /// Whether the intent is enabled in this catalog.
    pub fn has_intent(&self, intent: AnalysisIntent) -> bool {
        self.intents.iter().any(|option| option.value == intent)
    }

    /// Caption for a visualization kind with the variable substituted.
    pub fn caption_for(&self, kind: VisualizationKind, variable: &str) -> String {
        match self.captions.get(&kind) {
            Some(template) => template.replace(VARIABLE_PLACEHOLDER, variable),
            None => format!("{} of {}.", kind, variable),
        }
    }

    /// Category options for client forms.
    pub fn variable_options(&self) -> Vec<VariableOption> {
        self.categories
            .iter()
            .map(|c| VariableOption {
                value: c.name.clone(),
                label: c.label.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.categories.len(), 17);
        assert_eq!(catalog.category_by_name("croplands").unwrap().code, 12);
        assert_eq!(catalog.category_by_name(" Grasslands ").unwrap().code, 10);
        assert_eq!(catalog.category_by_code(255).unwrap().name, "no_data");
        assert!(catalog.category_by_name("tundra").is_none());
        assert_eq!(catalog.years.first(), Some(&2011));
        assert_eq!(catalog.years.last(), Some(&2020));
    }

    #[test]
    fn test_caption_substitution() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.caption_for(VisualizationKind::LineChart, "grasslands"),
            "Trend of grasslands over the selected years."
        );
    }

    #[test]
    fn test_yaml_catalog_with_defaults() {
        let yaml = r#"
categories:
  - code: 10
    name: grasslands
    label: Grasslands
  - code: 12
    name: croplands
    label: Croplands
intents:
  - value: spatial_distribution
    label: Spatial Distribution
"#;
        let catalog = Catalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        assert!(catalog.has_intent(AnalysisIntent::SpatialDistribution));
        assert!(!catalog.has_intent(AnalysisIntent::TrendAnalysis));
        assert_eq!(catalog.years.len(), 10);
        assert!(catalog.captions.contains_key(&VisualizationKind::PieChart));
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let yaml = r#"
categories:
  - code: 10
    name: grasslands
    label: Grasslands
  - code: 10
    name: meadows
    label: Meadows
"#;
        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::DuplicateCode(10))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        let yaml = serde_yaml::to_string(&Catalog::builtin()).unwrap();
        std::fs::write(&path, yaml).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.categories, Catalog::builtin().categories);
    }
}
