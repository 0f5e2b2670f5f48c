//! GeoTIFF fixtures for land-cover tests.
//!
//! Files are written with the `tiff` encoder and carry real GeoTIFF
//! georeferencing tags, so readers under test go through the same decode
//! path as production data.

use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tiff::TiffResult;

/// Per-year file name used by the land-cover data directory.
pub fn landcover_file_name(year: i32) -> String {
    format!("LC_Type1_{}.tif", year)
}

/// MODIS 500 m pixel size in sinusoidal meters.
pub const MODIS_PIXEL_SIZE: f64 = 463.312_716_527_916_7;

/// MODIS sphere radius in meters.
pub const MODIS_RADIUS: f64 = 6_371_007.181;

/// Georeferencing written into a fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixtureGeoref {
    /// EPSG:4326, upper-left corner and pixel size in degrees.
    Wgs84 {
        origin_lon: f64,
        origin_lat: f64,
        pixel_size: f64,
    },
    /// User-defined MODIS sinusoidal, upper-left corner and pixel size in meters.
    Sinusoidal {
        origin_x: f64,
        origin_y: f64,
        pixel_size: f64,
    },
    /// No georeferencing tags at all.
    None,
}

impl FixtureGeoref {
    /// A 0.01 degree grid with its upper-left corner at (lon, lat).
    pub fn wgs84(origin_lon: f64, origin_lat: f64) -> Self {
        Self::Wgs84 {
            origin_lon,
            origin_lat,
            pixel_size: 0.01,
        }
    }

    /// A MODIS 500 m grid with its upper-left corner at (x, y) meters.
    pub fn modis(origin_x: f64, origin_y: f64) -> Self {
        Self::Sinusoidal {
            origin_x,
            origin_y,
            pixel_size: MODIS_PIXEL_SIZE,
        }
    }

    fn origin_and_scale(&self) -> Option<([f64; 6], [f64; 3])> {
        let (x, y, s) = match *self {
            Self::Wgs84 {
                origin_lon,
                origin_lat,
                pixel_size,
            } => (origin_lon, origin_lat, pixel_size),
            Self::Sinusoidal {
                origin_x,
                origin_y,
                pixel_size,
            } => (origin_x, origin_y, pixel_size),
            Self::None => return None,
        };
        Some(([0.0, 0.0, 0.0, x, y, 0.0], [s, s, 0.0]))
    }

    /// GeoKey directory (header + sorted key entries).
    fn geokeys(&self) -> Vec<u16> {
        match self {
            Self::Wgs84 { .. } => vec![
                1, 1, 0, 3, //
                1024, 0, 1, 2, // GTModelType: geographic
                1025, 0, 1, 1, // GTRasterType: PixelIsArea
                2048, 0, 1, 4326, // GeographicType
            ],
            Self::Sinusoidal { .. } => vec![
                1, 1, 0, 10, //
                1024, 0, 1, 1, // GTModelType: projected
                1025, 0, 1, 1, // GTRasterType: PixelIsArea
                2057, 34736, 1, 3, // GeogSemiMajorAxis
                2058, 34736, 1, 4, // GeogSemiMinorAxis
                3072, 0, 1, 32767, // ProjectedCSType: user-defined
                3074, 0, 1, 32767, // Projection: user-defined
                3075, 0, 1, 24, // ProjCoordTrans: sinusoidal
                3082, 34736, 1, 1, // ProjFalseEasting
                3083, 34736, 1, 2, // ProjFalseNorthing
                3088, 34736, 1, 0, // ProjCenterLong
            ],
            Self::None => Vec::new(),
        }
    }

    fn double_params(&self) -> Vec<f64> {
        match self {
            Self::Sinusoidal { .. } => vec![0.0, 0.0, 0.0, MODIS_RADIUS, MODIS_RADIUS],
            _ => Vec::new(),
        }
    }
}

/// Write a single-band u8 GeoTIFF.
pub fn write_geotiff(
    path: &Path,
    width: usize,
    height: usize,
    data: &[u8],
    georef: FixtureGeoref,
) -> TiffResult<()> {
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(file)?;
    let mut image = encoder.new_image::<colortype::Gray8>(width as u32, height as u32)?;
    write_georef_tags(image.encoder(), georef)?;
    image.write_data(data)
}

/// Write a single-band u16 GeoTIFF (some land-cover exports use 16-bit).
pub fn write_geotiff_u16(
    path: &Path,
    width: usize,
    height: usize,
    data: &[u16],
    georef: FixtureGeoref,
) -> TiffResult<()> {
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(file)?;
    let mut image = encoder.new_image::<colortype::Gray16>(width as u32, height as u32)?;
    write_georef_tags(image.encoder(), georef)?;
    image.write_data(data)
}

fn write_georef_tags<W: std::io::Write + std::io::Seek, K: tiff::encoder::TiffKind>(
    dir: &mut tiff::encoder::DirectoryEncoder<'_, W, K>,
    georef: FixtureGeoref,
) -> TiffResult<()> {
    let Some((tiepoint, scale)) = georef.origin_and_scale() else {
        return Ok(());
    };
    dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
    dir.write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
    dir.write_tag(Tag::GeoKeyDirectoryTag, &georef.geokeys()[..])?;
    let doubles = georef.double_params();
    if !doubles.is_empty() {
        dir.write_tag(Tag::GeoDoubleParamsTag, &doubles[..])?;
    }
    Ok(())
}

/// A temporary land-cover data directory with one raster per year.
pub struct LandcoverDir {
    dir: TempDir,
}

impl LandcoverDir {
    /// Create an empty data directory.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path a raster for `year` would live at.
    pub fn raster_path(&self, year: i32) -> PathBuf {
        self.dir.path().join(landcover_file_name(year))
    }

    /// Write a WGS84 raster for `year`.
    pub fn add_year(&self, year: i32, width: usize, height: usize, data: &[u8]) -> TiffResult<()> {
        self.add_year_with(year, width, height, data, FixtureGeoref::wgs84(-100.0, 40.0))
    }

    /// Write a raster for `year` with explicit georeferencing.
    pub fn add_year_with(
        &self,
        year: i32,
        width: usize,
        height: usize,
        data: &[u8],
        georef: FixtureGeoref,
    ) -> TiffResult<()> {
        write_geotiff(&self.raster_path(year), width, height, data, georef)
    }
}

/// Build a data directory with one WGS84 raster per `(year, grid)` pair.
pub fn landcover_dir(width: usize, height: usize, years: &[(i32, Vec<u8>)]) -> LandcoverDir {
    let dir = LandcoverDir::new().expect("create temp dir");
    for (year, data) in years {
        dir.add_year(*year, width, height, data)
            .expect("write fixture raster");
    }
    dir
}
