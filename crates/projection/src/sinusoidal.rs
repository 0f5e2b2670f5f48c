//! Spherical sinusoidal projection.
//!
//! The MODIS land products (including the LC_Type1 land-cover layer) are
//! distributed on a sinusoidal grid over a sphere of radius 6371007.181 m.
//! The projection is equal-area, which is why a fixed per-pixel area is
//! meaningful for counts taken on the native grid.
//!
//! ```text
//! x = R * (lon - lon0) * cos(lat) + x0
//! y = R * lat + y0
//! ```

use landcover_common::SinusoidalParams;

use crate::MapProjection;

/// Sinusoidal projection parameters with precomputed radians.
#[derive(Debug, Clone, Copy)]
pub struct Sinusoidal {
    /// Central meridian in radians
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
    radius: f64,
}

impl Sinusoidal {
    pub fn new(params: SinusoidalParams) -> Self {
        Self {
            lon0: params.central_meridian.to_radians(),
            false_easting: params.false_easting,
            false_northing: params.false_northing,
            radius: params.radius,
        }
    }

    /// The MODIS grid definition.
    pub fn modis() -> Self {
        Self::new(SinusoidalParams::modis())
    }
}

/// Wrap an angle difference into [-PI, PI].
fn wrap_pi(mut angle: f64) -> f64 {
    use std::f64::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

impl MapProjection for Sinusoidal {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        let phi = lat.to_radians();
        let dlon = wrap_pi(lon.to_radians() - self.lon0);
        let x = self.radius * dlon * phi.cos() + self.false_easting;
        let y = self.radius * phi + self.false_northing;
        Some((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        use std::f64::consts::{FRAC_PI_2, PI};

        let phi = (y - self.false_northing) / self.radius;
        if phi.abs() > FRAC_PI_2 {
            return None;
        }
        let cos_phi = phi.cos();
        if cos_phi.abs() < 1e-12 {
            // At the poles every x maps to the central meridian.
            return Some((self.lon0.to_degrees(), phi.to_degrees()));
        }
        let dlon = (x - self.false_easting) / (self.radius * cos_phi);
        if dlon.abs() > PI {
            // Outside the sinusoidal envelope.
            return None;
        }
        let lon = wrap_pi(self.lon0 + dlon);
        Some((lon.to_degrees(), phi.to_degrees()))
    }
}
