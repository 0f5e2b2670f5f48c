//! Semantic validation of incoming queries.
//!
//! Runs before any raster is touched. Checks, in order: intent present,
//! intent known, at least one variable, one or two distinct years, every
//! variable in the catalog.

use std::collections::HashSet;

use landcover_common::{AnalysisIntent, Catalog, Category, Query, QueryError, ValidatedQuery};

use crate::registry::IntentRegistry;

/// Validate `query` against the catalog and registry.
pub fn validate_query(
    query: &Query,
    catalog: &Catalog,
    registry: &IntentRegistry,
) -> Result<ValidatedQuery, QueryError> {
    let raw_intent = query.intent.trim();
    if raw_intent.is_empty() {
        return Err(QueryError::MissingIntent);
    }
    let intent = raw_intent
        .parse::<AnalysisIntent>()
        .ok()
        .filter(|i| registry.is_registered(*i) && catalog.has_intent(*i))
        .ok_or_else(|| QueryError::UnknownIntent(raw_intent.to_string()))?;

    let names: Vec<&str> = query
        .variables
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if names.is_empty() {
        return Err(QueryError::NoVariables);
    }

    if !(1..=2).contains(&query.years.len()) {
        return Err(QueryError::InvalidYearCount(query.years.len()));
    }
    let mut seen = HashSet::new();
    for &year in &query.years {
        if !seen.insert(year) {
            return Err(QueryError::DuplicateYear(year));
        }
    }

    let mut categories: Vec<Category> = Vec::with_capacity(names.len());
    for name in names {
        let category = catalog
            .category_by_name(name)
            .ok_or_else(|| QueryError::UnknownCategory {
                name: name.to_string(),
                valid: catalog.category_names(),
            })?;
        if !categories.iter().any(|c| c.code == category.code) {
            categories.push(category.clone());
        }
    }

    Ok(ValidatedQuery {
        intent,
        categories,
        years: query.years.clone(),
        comment: query
            .comment
            .as_ref()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    })
}
