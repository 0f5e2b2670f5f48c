//! Land-cover raster reader.
//!
//! Reads one single-band categorical GeoTIFF per year from a data
//! directory, following a fixed naming convention (`LC_Type1_{year}.tif`
//! by default). Georeferencing comes from the standard GeoTIFF tags:
//!
//! - `ModelTransformation`, or `ModelTiepoint` + `ModelPixelScale`
//! - the GeoKey directory for the CRS (WGS84, Web Mercator, or the
//!   user-defined sinusoidal grid used by MODIS)
//!
//! Frames are decoded fresh on every call. [`RasterFrame::to_wgs84`]
//! produces the display copy with nearest-neighbour resampling.

pub mod error;
pub mod geokeys;
pub mod reader;
pub mod source;

pub use error::{RasterError, RasterResult};
pub use geokeys::GeoKeyDirectory;
pub use reader::{
    decode_geotiff, raster_path, read_raster, RasterFrame, DEFAULT_FILE_TEMPLATE,
    DEFAULT_MAX_DECODE_BYTES, YEAR_PLACEHOLDER,
};
pub use source::{GeoTiffDirectory, RasterSource};
