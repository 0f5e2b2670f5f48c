//! Raster sources keyed by year.

use std::path::{Path, PathBuf};

use crate::error::RasterResult;
use crate::reader::{
    raster_path, read_raster, RasterFrame, DEFAULT_FILE_TEMPLATE, DEFAULT_MAX_DECODE_BYTES,
};

/// Anything that can produce the raster for a year.
///
/// The production implementation reads GeoTIFFs from a directory; tests
/// substitute counting or in-memory sources.
pub trait RasterSource: Send + Sync {
    fn read(&self, year: i32) -> RasterResult<RasterFrame>;
}

/// A directory of per-year GeoTIFF files.
#[derive(Debug, Clone)]
pub struct GeoTiffDirectory {
    root: PathBuf,
    template: String,
    max_decode_bytes: usize,
}

impl GeoTiffDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            template: DEFAULT_FILE_TEMPLATE.to_string(),
            max_decode_bytes: DEFAULT_MAX_DECODE_BYTES,
        }
    }

    /// Override the per-year file name template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Override the decoded buffer budget per file.
    pub fn with_max_decode_bytes(mut self, max_decode_bytes: usize) -> Self {
        self.max_decode_bytes = max_decode_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, year: i32) -> PathBuf {
        raster_path(&self.root, &self.template, year)
    }
}

impl RasterSource for GeoTiffDirectory {
    fn read(&self, year: i32) -> RasterResult<RasterFrame> {
        read_raster(year, &self.root, &self.template, self.max_decode_bytes)
    }
}
