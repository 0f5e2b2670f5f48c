//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference systems recognised in land-cover rasters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees). The display CRS.
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// Spherical sinusoidal, as used by the MODIS land products.
    Sinusoidal(SinusoidalParams),
    /// Any other EPSG code found in the GeoKey directory.
    Epsg(u16),
}

impl CrsCode {
    /// Map an EPSG code from a GeoTIFF key to a known CRS.
    ///
    /// NAD83 (4269) is treated as WGS84; the sub-meter datum shift is
    /// irrelevant at land-cover resolutions.
    pub fn from_epsg(code: u16) -> Self {
        match code {
            4326 | 4269 => CrsCode::Epsg4326,
            3857 => CrsCode::Epsg3857,
            other => CrsCode::Epsg(other),
        }
    }

    /// Check if this is the WGS84 display CRS.
    pub fn is_wgs84(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        self.is_wgs84()
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsCode::Epsg4326 => write!(f, "EPSG:4326"),
            CrsCode::Epsg3857 => write!(f, "EPSG:3857"),
            CrsCode::Sinusoidal(p) => write!(
                f,
                "+proj=sinu +lon_0={} +x_0={} +y_0={} +R={}",
                p.central_meridian, p.false_easting, p.false_northing, p.radius
            ),
            CrsCode::Epsg(code) => write!(f, "EPSG:{}", code),
        }
    }
}

/// Parameters of a spherical sinusoidal projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SinusoidalParams {
    /// Central meridian in degrees
    pub central_meridian: f64,
    /// False easting in meters
    pub false_easting: f64,
    /// False northing in meters
    pub false_northing: f64,
    /// Sphere radius in meters
    pub radius: f64,
}

impl SinusoidalParams {
    /// MODIS sinusoidal grid sphere radius (meters).
    pub const MODIS_RADIUS: f64 = 6_371_007.181;

    /// The MODIS tile grid definition.
    pub fn modis() -> Self {
        Self {
            central_meridian: 0.0,
            false_easting: 0.0,
            false_northing: 0.0,
            radius: Self::MODIS_RADIUS,
        }
    }
}

impl Default for SinusoidalParams {
    fn default() -> Self {
        Self::modis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_epsg() {
        assert_eq!(CrsCode::from_epsg(4326), CrsCode::Epsg4326);
        assert_eq!(CrsCode::from_epsg(4269), CrsCode::Epsg4326);
        assert_eq!(CrsCode::from_epsg(3857), CrsCode::Epsg3857);
        assert_eq!(CrsCode::from_epsg(32633), CrsCode::Epsg(32633));
    }

    #[test]
    fn test_display() {
        assert_eq!(CrsCode::Epsg4326.to_string(), "EPSG:4326");
        assert!(CrsCode::Sinusoidal(SinusoidalParams::modis())
            .to_string()
            .starts_with("+proj=sinu"));
        assert!(CrsCode::Epsg4326.is_wgs84());
        assert!(!CrsCode::Epsg3857.is_geographic());
    }
}
