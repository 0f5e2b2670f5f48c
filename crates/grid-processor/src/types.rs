//! Core types for grid processing.

use landcover_common::{BoundingBox, CrsCode, GeoTransform, NO_DATA_CODE};

use crate::config::ResamplingMethod;
use crate::downsample::{downsample_stride, stride_for};
use crate::error::{GridProcessorError, Result};

/// A single-band grid of category codes with its georeferencing.
///
/// Cells are stored row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalGrid {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
    pub transform: GeoTransform,
    pub crs: CrsCode,
}

impl CategoricalGrid {
    /// Create a grid, checking the buffer against its dimensions.
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<u8>,
        transform: GeoTransform,
        crs: CrsCode,
    ) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(GridProcessorError::InvalidDimensions {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            transform,
            crs,
        })
    }

    /// Code at a cell, or `None` outside the grid.
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<u8> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extent in the grid's own CRS.
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    /// Count of cells holding a real class code.
    pub fn valid_count(&self) -> u64 {
        self.data.iter().filter(|&&c| c != NO_DATA_CODE).count() as u64
    }

    /// Same grid in WGS84; see [`crate::reproject_to_wgs84`].
    pub fn reproject_to_wgs84(&self, method: ResamplingMethod) -> Result<CategoricalGrid> {
        crate::reproject::reproject_to_wgs84(self, method)
    }

    /// Coarsen so neither side exceeds `max_dim`, keeping the extent.
    pub fn downsampled(&self, max_dim: usize) -> CategoricalGrid {
        let stride = stride_for(self.width, self.height, max_dim);
        if stride == 1 {
            return self.clone();
        }
        let (data, width, height) = downsample_stride(&self.data, self.width, self.height, stride);
        let s = stride as f64;
        let transform = GeoTransform {
            pixel_width: self.transform.pixel_width * s,
            row_rotation: self.transform.row_rotation * s,
            col_rotation: self.transform.col_rotation * s,
            pixel_height: self.transform.pixel_height * s,
            ..self.transform
        };
        CategoricalGrid {
            width,
            height,
            data,
            transform,
            crs: self.crs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize) -> CategoricalGrid {
        let data = (0..width * height).map(|i| (i % 17) as u8).collect();
        CategoricalGrid::new(
            width,
            height,
            data,
            GeoTransform::north_up(10.0, 50.0, 0.5, 0.5),
            CrsCode::Epsg4326,
        )
        .unwrap()
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = CategoricalGrid::new(
            3,
            3,
            vec![0; 8],
            GeoTransform::north_up(0.0, 0.0, 1.0, 1.0),
            CrsCode::Epsg4326,
        );
        assert!(matches!(
            err,
            Err(GridProcessorError::InvalidDimensions { actual: 8, .. })
        ));
    }

    #[test]
    fn test_bounds() {
        let g = grid(4, 2);
        let b = g.bounds();
        assert_eq!((b.min_x, b.max_x), (10.0, 12.0));
        assert_eq!((b.min_y, b.max_y), (49.0, 50.0));
    }

    #[test]
    fn test_downsampled_keeps_extent() {
        let g = grid(100, 40);
        let small = g.downsampled(25);
        assert_eq!(small.width, 25);
        assert_eq!(small.height, 10);
        let (a, b) = (g.bounds(), small.bounds());
        assert!((a.max_x - b.max_x).abs() < 1e-9);
        assert!((a.min_y - b.min_y).abs() < 1e-9);
    }

    #[test]
    fn test_valid_count() {
        let mut g = grid(2, 2);
        g.data = vec![1, NO_DATA_CODE, 12, NO_DATA_CODE];
        assert_eq!(g.valid_count(), 2);
        assert_eq!(g.get(0, 1), Some(12));
        assert_eq!(g.get(2, 0), None);
    }
}
