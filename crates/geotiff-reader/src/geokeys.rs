//! GeoKey directory parsing.
//!
//! The `GeoKeyDirectoryTag` is a flat `u16` array: a four-entry header
//! (version, revision, minor revision, key count) followed by one
//! `(key id, tag location, count, value/offset)` quadruple per key. A tag
//! location of 0 stores the value inline; 34736 points into
//! `GeoDoubleParamsTag`. ASCII parameters are not needed here and are
//! skipped.

use std::collections::HashMap;

use landcover_common::{CrsCode, SinusoidalParams};

use crate::error::{RasterError, RasterResult};

pub const GT_MODEL_TYPE: u16 = 1024;
pub const GT_RASTER_TYPE: u16 = 1025;
pub const GEOGRAPHIC_TYPE: u16 = 2048;
pub const GEOG_SEMI_MAJOR_AXIS: u16 = 2057;
pub const PROJECTED_CS_TYPE: u16 = 3072;
pub const PROJ_COORD_TRANS: u16 = 3075;
pub const PROJ_NAT_ORIGIN_LONG: u16 = 3080;
pub const PROJ_FALSE_EASTING: u16 = 3082;
pub const PROJ_FALSE_NORTHING: u16 = 3083;
pub const PROJ_CENTER_LONG: u16 = 3088;

const GEO_DOUBLE_PARAMS_TAG: u16 = 34736;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;
const CT_SINUSOIDAL: u16 = 24;

#[derive(Debug, Clone, PartialEq)]
enum GeoKeyValue {
    Short(u16),
    Double(Vec<f64>),
}

/// Parsed GeoKey directory.
#[derive(Debug, Clone, Default)]
pub struct GeoKeyDirectory {
    keys: HashMap<u16, GeoKeyValue>,
}

impl GeoKeyDirectory {
    /// Parse the raw directory and its double parameters.
    pub fn parse(directory: &[u16], doubles: &[f64]) -> RasterResult<Self> {
        if directory.len() < 4 {
            return Err(RasterError::InvalidGeoKeys(format!(
                "header has {} entries",
                directory.len()
            )));
        }
        let count = directory[3] as usize;
        let entries = &directory[4..];
        if entries.len() < count * 4 {
            return Err(RasterError::InvalidGeoKeys(format!(
                "{} keys declared, {} present",
                count,
                entries.len() / 4
            )));
        }

        let mut keys = HashMap::with_capacity(count);
        for entry in entries.chunks_exact(4).take(count) {
            let (id, location, n, value) = (entry[0], entry[1], entry[2] as usize, entry[3]);
            match location {
                0 => {
                    keys.insert(id, GeoKeyValue::Short(value));
                }
                GEO_DOUBLE_PARAMS_TAG => {
                    let start = value as usize;
                    let slice = doubles.get(start..start + n).ok_or_else(|| {
                        RasterError::InvalidGeoKeys(format!(
                            "key {} points past GeoDoubleParams ({} values)",
                            id,
                            doubles.len()
                        ))
                    })?;
                    keys.insert(id, GeoKeyValue::Double(slice.to_vec()));
                }
                _ => {}
            }
        }

        Ok(Self { keys })
    }

    pub fn short(&self, key: u16) -> Option<u16> {
        match self.keys.get(&key) {
            Some(GeoKeyValue::Short(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn double(&self, key: u16) -> Option<f64> {
        match self.keys.get(&key) {
            Some(GeoKeyValue::Double(v)) => v.first().copied(),
            _ => None,
        }
    }

    /// Pixel values refer to cell centres rather than areas.
    pub fn is_pixel_is_point(&self) -> bool {
        self.short(GT_RASTER_TYPE) == Some(RASTER_PIXEL_IS_POINT)
    }

    /// Work out the CRS described by the keys.
    ///
    /// Geographic rasters without an explicit code are taken as WGS84.
    pub fn crs(&self) -> CrsCode {
        match self.short(GT_MODEL_TYPE) {
            Some(MODEL_TYPE_PROJECTED) => self.projected_crs(),
            Some(MODEL_TYPE_GEOGRAPHIC) | None => match self.short(GEOGRAPHIC_TYPE) {
                Some(code) if code != USER_DEFINED => CrsCode::from_epsg(code),
                _ => CrsCode::Epsg4326,
            },
            Some(other) => CrsCode::Epsg(other),
        }
    }

    fn projected_crs(&self) -> CrsCode {
        match self.short(PROJECTED_CS_TYPE) {
            Some(code) if code != USER_DEFINED => CrsCode::from_epsg(code),
            _ if self.short(PROJ_COORD_TRANS) == Some(CT_SINUSOIDAL) => {
                let defaults = SinusoidalParams::modis();
                CrsCode::Sinusoidal(SinusoidalParams {
                    central_meridian: self
                        .double(PROJ_CENTER_LONG)
                        .or_else(|| self.double(PROJ_NAT_ORIGIN_LONG))
                        .unwrap_or(defaults.central_meridian),
                    false_easting: self.double(PROJ_FALSE_EASTING).unwrap_or(0.0),
                    false_northing: self.double(PROJ_FALSE_NORTHING).unwrap_or(0.0),
                    radius: self.double(GEOG_SEMI_MAJOR_AXIS).unwrap_or(defaults.radius),
                })
            }
            _ => CrsCode::Epsg(USER_DEFINED),
        }
    }
}
