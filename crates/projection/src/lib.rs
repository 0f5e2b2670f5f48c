//! Coordinate reference system transformations.
//!
//! Implements the handful of map projections land-cover rasters arrive in,
//! from scratch and on a sphere. Every projection converts between
//! geographic degrees (lon, lat) and projected meters (x, y).

pub mod mercator;
pub mod sinusoidal;

pub use mercator::WebMercator;
pub use sinusoidal::Sinusoidal;

use landcover_common::CrsCode;
use thiserror::Error;

/// Errors raised when a CRS has no projection implementation.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Unsupported CRS for reprojection: {0}")]
    UnsupportedCrs(String),
}

/// A forward/inverse map projection.
///
/// Both directions return `None` for points the projection cannot
/// represent (outside the valid domain, beyond the poles, etc).
pub trait MapProjection: Send + Sync {
    /// Geographic (lon, lat) in degrees to projected (x, y).
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;

    /// Projected (x, y) to geographic (lon, lat) in degrees.
    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)>;
}

/// Identity projection for rasters already in WGS84.
#[derive(Debug, Clone, Copy, Default)]
pub struct Geographic;

impl MapProjection for Geographic {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        Some((lon, lat))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        Some((x, y))
    }
}

/// Pick the projection implementation for a CRS.
pub fn for_crs(crs: &CrsCode) -> Result<Box<dyn MapProjection>, ProjectionError> {
    match crs {
        CrsCode::Epsg4326 => Ok(Box::new(Geographic)),
        CrsCode::Epsg3857 => Ok(Box::new(WebMercator::default())),
        CrsCode::Sinusoidal(params) => Ok(Box::new(Sinusoidal::new(*params))),
        CrsCode::Epsg(_) => Err(ProjectionError::UnsupportedCrs(crs.to_string())),
    }
}
