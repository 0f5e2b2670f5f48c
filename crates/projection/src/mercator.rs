//! Spherical Web Mercator (EPSG:3857).

use crate::MapProjection;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Web Mercator on the WGS84 semi-major axis sphere.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self {
            radius: 6_378_137.0,
        }
    }
}

impl MapProjection for WebMercator {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if lat.abs() > MAX_LATITUDE {
            return None;
        }
        let x = self.radius * lon.to_radians();
        let y = self.radius
            * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
                .tan()
                .ln();
        Some((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        Some((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_extent() {
        let proj = WebMercator::default();
        let (x, _) = proj.forward(180.0, 0.0).unwrap();
        assert!((x - 20_037_508.342_789_244).abs() < 1e-3);
        let (_, y) = proj.forward(0.0, MAX_LATITUDE).unwrap();
        assert!((y - 20_037_508.342_789_244).abs() < 1.0);
    }

    #[test]
    fn test_roundtrip() {
        let proj = WebMercator::default();
        let (x, y) = proj.forward(-97.5, 38.5).unwrap();
        let (lon, lat) = proj.inverse(x, y).unwrap();
        assert!((lon + 97.5).abs() < 1e-9);
        assert!((lat - 38.5).abs() < 1e-9);
    }

    #[test]
    fn test_polar_latitudes_rejected() {
        assert!(WebMercator::default().forward(0.0, 89.0).is_none());
    }
}
