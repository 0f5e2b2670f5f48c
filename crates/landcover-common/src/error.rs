//! Error types for query validation and catalog loading.

use thiserror::Error;

/// Reasons a query is rejected before any raster is read.
///
/// These are recovered at the request boundary: the caller still gets a
/// normal response whose text is [`QueryError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Missing analysis type")]
    MissingIntent,

    #[error("Unsupported analysis type: {0}")]
    UnknownIntent(String),

    #[error("No variables selected")]
    NoVariables,

    #[error("Expected one or two years, got {0}")]
    InvalidYearCount(usize),

    #[error("Duplicate year: {0}")]
    DuplicateYear(i32),

    #[error("Invalid year value: {0}")]
    InvalidYear(String),

    #[error("Unknown category: {name}")]
    UnknownCategory { name: String, valid: Vec<String> },
}

impl QueryError {
    /// Text shown to the user in place of an analysis.
    pub fn user_message(&self) -> String {
        match self {
            QueryError::MissingIntent => "Please select an analysis type.".to_string(),
            QueryError::UnknownIntent(intent) => format!("Unsupported analysis type: {}.", intent),
            QueryError::NoVariables => "Please select at least one variable.".to_string(),
            QueryError::InvalidYearCount(_) | QueryError::DuplicateYear(_) => {
                "Please select one or two years.".to_string()
            }
            QueryError::InvalidYear(value) => format!("Invalid year: {}.", value),
            QueryError::UnknownCategory { name, valid } => format!(
                "Invalid variable: {}. Must be one of: {}",
                name,
                valid.join(", ")
            ),
        }
    }

    /// Short machine-readable code, used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::MissingIntent => "missing_intent",
            QueryError::UnknownIntent(_) => "unknown_intent",
            QueryError::NoVariables => "no_variables",
            QueryError::InvalidYearCount(_) => "invalid_year_count",
            QueryError::DuplicateYear(_) => "duplicate_year",
            QueryError::InvalidYear(_) => "invalid_year",
            QueryError::UnknownCategory { .. } => "unknown_category",
        }
    }
}

/// Errors while loading or validating the configuration catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Duplicate category code {0}")]
    DuplicateCode(u8),

    #[error("Duplicate category name '{0}'")]
    DuplicateName(String),

    #[error("Catalog has no categories")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            QueryError::NoVariables.user_message(),
            "Please select at least one variable."
        );
        assert_eq!(
            QueryError::InvalidYearCount(3).user_message(),
            "Please select one or two years."
        );
        assert_eq!(
            QueryError::MissingIntent.user_message(),
            "Please select an analysis type."
        );
        let err = QueryError::UnknownCategory {
            name: "tundra".to_string(),
            valid: vec!["grasslands".to_string(), "croplands".to_string()],
        };
        assert_eq!(
            err.user_message(),
            "Invalid variable: tundra. Must be one of: grasslands, croplands"
        );
    }
}
