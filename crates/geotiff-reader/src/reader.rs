//! GeoTIFF decoding into [`RasterFrame`]s.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use grid_processor::{CategoricalGrid, ResamplingMethod};
use landcover_common::{BoundingBox, CrsCode, GeoTransform, NO_DATA_CODE};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::{debug, instrument};

use crate::error::{RasterError, RasterResult};
use crate::geokeys::GeoKeyDirectory;

/// Default per-year file name; `{year}` is replaced by the year.
pub const DEFAULT_FILE_TEMPLATE: &str = "LC_Type1_{year}.tif";

/// Placeholder substituted in file templates.
pub const YEAR_PLACEHOLDER: &str = "{year}";

/// Largest decoded sample buffer accepted from one file (1 GiB).
///
/// A 12x6 tile mosaic of 2400x2400 MODIS cells at 16 bits per sample is
/// about 830 MB.
pub const DEFAULT_MAX_DECODE_BYTES: usize = 1 << 30;

/// One decoded land-cover raster for one year.
///
/// Held for the duration of a single request; never cached.
#[derive(Debug, Clone)]
pub struct RasterFrame {
    pub year: i32,
    pub path: PathBuf,
    pub grid: CategoricalGrid,
}

impl RasterFrame {
    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    /// Row-major category codes.
    pub fn codes(&self) -> &[u8] {
        &self.grid.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.grid.transform
    }

    pub fn crs(&self) -> CrsCode {
        self.grid.crs
    }

    /// Extent in the frame's own CRS.
    pub fn bounds(&self) -> BoundingBox {
        self.grid.bounds()
    }

    /// Copy of this frame in WGS84, computed in memory.
    pub fn to_wgs84(&self, method: ResamplingMethod) -> RasterResult<RasterFrame> {
        let grid = self
            .grid
            .reproject_to_wgs84(method)
            .map_err(|e| RasterError::Projection(e.to_string()))?;
        Ok(RasterFrame {
            year: self.year,
            path: self.path.clone(),
            grid,
        })
    }
}

/// Resolve the file for `year` under `data_dir`.
pub fn raster_path(data_dir: &Path, template: &str, year: i32) -> PathBuf {
    data_dir.join(template.replace(YEAR_PLACEHOLDER, &year.to_string()))
}

/// Read the raster for `year` from `data_dir`.
///
/// Fails with [`RasterError::NotFound`] when the file is absent and with
/// [`RasterError::TooLarge`] when its samples would exceed
/// `max_decode_bytes`. Every call goes back to disk.
#[instrument(skip(data_dir, template), fields(path))]
pub fn read_raster(
    year: i32,
    data_dir: &Path,
    template: &str,
    max_decode_bytes: usize,
) -> RasterResult<RasterFrame> {
    let path = raster_path(data_dir, template, year);
    tracing::Span::current().record("path", &tracing::field::display(path.display()));

    if !path.is_file() {
        return Err(RasterError::NotFound { year, path });
    }

    let file = BufReader::new(File::open(&path)?);
    let grid = decode_geotiff(file, &path, max_decode_bytes)?;

    debug!(
        width = grid.width,
        height = grid.height,
        crs = %grid.crs,
        "Decoded land-cover raster"
    );

    Ok(RasterFrame { year, path, grid })
}

/// Decode a single-band GeoTIFF into a categorical grid.
///
/// The header's dimensions are checked against `max_decode_bytes` before
/// any sample buffer is allocated.
pub fn decode_geotiff<R: Read + Seek>(
    reader: R,
    path: &Path,
    max_decode_bytes: usize,
) -> RasterResult<CategoricalGrid> {
    let mut limits = Limits::default();
    limits.decoding_buffer_size = max_decode_bytes;
    limits.intermediate_buffer_size = max_decode_bytes;
    let mut decoder = Decoder::new(reader)?.with_limits(limits);

    let bits = match decoder.colortype()? {
        ColorType::Gray(bits) => bits,
        other => {
            return Err(RasterError::UnsupportedSampleFormat(format!(
                "expected a single band, found {:?}",
                other
            )))
        }
    };

    let (width, height) = decoder.dimensions()?;
    let needed = (width as u64)
        .saturating_mul(height as u64)
        .saturating_mul((u64::from(bits) + 7) / 8);
    if needed > max_decode_bytes as u64 {
        return Err(RasterError::TooLarge {
            width,
            height,
            limit: max_decode_bytes,
        });
    }

    let transform = read_transform(&mut decoder, path)?;
    let keys = read_geokeys(&mut decoder)?;
    let transform = if keys.is_pixel_is_point() {
        transform.shifted(-0.5, -0.5)
    } else {
        transform
    };

    let codes = match decoder.read_image()? {
        DecodingResult::U8(v) => v,
        DecodingResult::U16(v) => to_codes(v),
        DecodingResult::I16(v) => to_codes(v),
        DecodingResult::U32(v) => to_codes(v),
        DecodingResult::I32(v) => to_codes(v),
        DecodingResult::I8(v) => to_codes(v),
        _ => {
            return Err(RasterError::UnsupportedSampleFormat(
                "floating point or 64-bit samples".to_string(),
            ))
        }
    };

    Ok(CategoricalGrid::new(
        width as usize,
        height as usize,
        codes,
        transform,
        keys.crs(),
    )?)
}

/// Narrow samples to category codes; anything outside 0..=255 is no-data.
fn to_codes<T: TryInto<u8>>(values: Vec<T>) -> Vec<u8> {
    values
        .into_iter()
        .map(|v| v.try_into().unwrap_or(NO_DATA_CODE))
        .collect()
}

fn find_f64s<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
) -> RasterResult<Option<Vec<f64>>> {
    Ok(decoder.find_tag(tag)?.map(|v| v.into_f64_vec()).transpose()?)
}

fn read_transform<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
) -> RasterResult<GeoTransform> {
    if let Some(m) = find_f64s(decoder, Tag::ModelTransformationTag)? {
        if let Ok(matrix) = <[f64; 16]>::try_from(m.as_slice()) {
            return Ok(GeoTransform::from_model_transformation(&matrix));
        }
    }

    let tiepoint = find_f64s(decoder, Tag::ModelTiepointTag)?;
    let scale = find_f64s(decoder, Tag::ModelPixelScaleTag)?;
    match (tiepoint, scale) {
        (Some(t), Some(s)) if t.len() >= 6 && s.len() >= 3 => {
            let tiepoint = [t[0], t[1], t[2], t[3], t[4], t[5]];
            let scale = [s[0], s[1], s[2]];
            Ok(GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale))
        }
        _ => Err(RasterError::MissingGeoreference(path.to_path_buf())),
    }
}

fn read_geokeys<R: Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<GeoKeyDirectory> {
    let Some(directory) = decoder.find_tag(Tag::GeoKeyDirectoryTag)? else {
        debug!("No GeoKey directory, assuming WGS84");
        return Ok(GeoKeyDirectory::default());
    };
    let directory: Vec<u16> = directory
        .into_u32_vec()?
        .into_iter()
        .map(|v| v as u16)
        .collect();
    let doubles = find_f64s(decoder, Tag::GeoDoubleParamsTag)?.unwrap_or_default();
    GeoKeyDirectory::parse(&directory, &doubles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_path() {
        let path = raster_path(Path::new("/data"), DEFAULT_FILE_TEMPLATE, 2015);
        assert_eq!(path, PathBuf::from("/data/LC_Type1_2015.tif"));
    }

    #[test]
    fn test_to_codes_maps_out_of_range() {
        assert_eq!(to_codes(vec![0u16, 12, 255, 256, 1000]), vec![0, 12, 255, 255, 255]);
        assert_eq!(to_codes(vec![-1i16, 7]), vec![255, 7]);
    }

    #[test]
    fn test_missing_year_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_raster(2099, dir.path(), DEFAULT_FILE_TEMPLATE, DEFAULT_MAX_DECODE_BYTES)
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("2099"));
    }
}
