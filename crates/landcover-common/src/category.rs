//! Land-cover categories.

use serde::{Deserialize, Serialize};

/// Raster value marking cells without a land-cover classification.
pub const NO_DATA_CODE: u8 = 255;

/// A named land-cover class with its stable raster code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Integer code stored in the raster (1-16, 255 = no data)
    pub code: u8,
    /// Machine name used in queries, e.g. "croplands"
    pub name: String,
    /// Human-readable label, e.g. "Croplands"
    pub label: String,
}

impl Category {
    pub fn new(code: u8, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            label: label.into(),
        }
    }

    /// Whether this is the "no data" pseudo-category.
    pub fn is_no_data(&self) -> bool {
        self.code == NO_DATA_CODE
    }
}
