//! Affine pixel-to-world transforms for georeferenced rasters.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// GDAL-style affine geotransform.
///
/// Maps a (column, row) pixel-corner coordinate to world coordinates:
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// `pixel_height` is negative for the usual north-up raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height: -pixel_height.abs(),
        }
    }

    /// Build from a GeoTIFF `ModelTiepoint` (I, J, K, X, Y, Z) and
    /// `ModelPixelScale` (Sx, Sy, Sz) pair.
    pub fn from_tiepoint_and_scale(tiepoint: &[f64; 6], scale: &[f64; 3]) -> Self {
        let [i, j, _, x, y, _] = *tiepoint;
        let [sx, sy, _] = *scale;
        Self {
            origin_x: x - i * sx,
            pixel_width: sx,
            row_rotation: 0.0,
            origin_y: y + j * sy,
            col_rotation: 0.0,
            pixel_height: -sy,
        }
    }

    /// Build from a GeoTIFF `ModelTransformation` 4x4 row-major matrix.
    pub fn from_model_transformation(m: &[f64; 16]) -> Self {
        Self {
            origin_x: m[3],
            pixel_width: m[0],
            row_rotation: m[1],
            origin_y: m[7],
            col_rotation: m[4],
            pixel_height: m[5],
        }
    }

    /// Shift the origin by a fraction of a pixel (used for PixelIsPoint rasters).
    pub fn shifted(&self, d_col: f64, d_row: f64) -> Self {
        let (x, y) = self.apply(d_col, d_row);
        Self {
            origin_x: x,
            origin_y: y,
            ..*self
        }
    }

    /// Apply the transform to a pixel coordinate.
    #[inline]
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// World coordinates of a pixel centre.
    #[inline]
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Inverse transform (world to pixel), or `None` if degenerate.
    ///
    /// The returned value is itself a `GeoTransform`; calling `apply(x, y)` on
    /// it yields fractional `(col, row)`.
    pub fn inverse(&self) -> Option<GeoTransform> {
        let m = Matrix3::new(
            self.pixel_width,
            self.row_rotation,
            self.origin_x,
            self.col_rotation,
            self.pixel_height,
            self.origin_y,
            0.0,
            0.0,
            1.0,
        );
        let inv = m.try_inverse()?;
        Some(GeoTransform {
            origin_x: inv[(0, 2)],
            pixel_width: inv[(0, 0)],
            row_rotation: inv[(0, 1)],
            origin_y: inv[(1, 2)],
            col_rotation: inv[(1, 0)],
            pixel_height: inv[(1, 1)],
        })
    }

    /// Check for a rotation-free transform.
    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    /// World extent covered by a `width` x `height` raster.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];
        BoundingBox::from_points(corners).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiepoint_and_scale() {
        let gt = GeoTransform::from_tiepoint_and_scale(
            &[0.0, 0.0, 0.0, -10.0, 50.0, 0.0],
            &[0.5, 0.5, 0.0],
        );
        assert_eq!(gt.apply(0.0, 0.0), (-10.0, 50.0));
        assert_eq!(gt.apply(2.0, 4.0), (-9.0, 48.0));
        assert_eq!(gt.pixel_center(0, 0), (-9.75, 49.75));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let gt = GeoTransform::north_up(100.0, 200.0, 2.0, 4.0);
        let inv = gt.inverse().unwrap();
        let (x, y) = gt.apply(3.5, 7.25);
        let (col, row) = inv.apply(x, y);
        assert!((col - 3.5).abs() < 1e-9);
        assert!((row - 7.25).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inverse() {
        let gt = GeoTransform::north_up(0.0, 0.0, 0.0, 1.0);
        assert!(gt.inverse().is_none());
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::north_up(-10.0, 50.0, 0.5, 0.5);
        let bbox = gt.bounds(40, 20);
        assert_eq!(bbox, BoundingBox::new(-10.0, 40.0, 10.0, 50.0));
    }
}
