//! Reprojection of categorical grids to WGS84.
//!
//! The output grid keeps the input's pixel count. Its extent is the
//! geographic bounding box of the source footprint, found by sampling the
//! grid edges through the inverse projection. Each output cell takes the
//! code of the source cell under its centre; cells with no source are
//! no-data.

use landcover_common::{BoundingBox, CrsCode, GeoTransform, NO_DATA_CODE};
use projection::MapProjection;
use rayon::prelude::*;
use tracing::debug;

use crate::config::ResamplingMethod;
use crate::error::{GridProcessorError, Result};
use crate::types::CategoricalGrid;

/// Points sampled along each grid edge when computing the footprint.
const EDGE_SAMPLES: usize = 64;

/// Reproject a grid to EPSG:4326 with nearest-neighbour lookup.
///
/// Grids already in WGS84 are returned unchanged. Any method other than
/// [`ResamplingMethod::Nearest`] is rejected.
pub fn reproject_to_wgs84(
    grid: &CategoricalGrid,
    method: ResamplingMethod,
) -> Result<CategoricalGrid> {
    method.ensure_categorical()?;

    if grid.crs.is_wgs84() {
        return Ok(grid.clone());
    }

    let proj = projection::for_crs(&grid.crs)?;
    let to_pixel = grid
        .transform
        .inverse()
        .ok_or(GridProcessorError::DegenerateTransform)?;
    let footprint = geographic_footprint(grid, proj.as_ref())?;

    let (width, height) = (grid.width, grid.height);
    let transform = GeoTransform::north_up(
        footprint.min_x,
        footprint.max_y,
        footprint.width() / width as f64,
        footprint.height() / height as f64,
    );

    debug!(
        source_crs = %grid.crs,
        width,
        height,
        min_lon = footprint.min_x,
        max_lon = footprint.max_x,
        min_lat = footprint.min_y,
        max_lat = footprint.max_y,
        "Reprojecting grid to WGS84"
    );

    let mut data = vec![NO_DATA_CODE; width * height];
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out_row)| {
            for (col, cell) in out_row.iter_mut().enumerate() {
                let (lon, lat) = transform.pixel_center(col, row);
                let Some((x, y)) = proj.forward(lon, lat) else {
                    continue;
                };
                let (src_col, src_row) = to_pixel.apply(x, y);
                if src_col < 0.0 || src_row < 0.0 {
                    continue;
                }
                if let Some(code) = grid.get(src_col as usize, src_row as usize) {
                    *cell = code;
                }
            }
        });

    Ok(CategoricalGrid {
        width,
        height,
        data,
        transform,
        crs: CrsCode::Epsg4326,
    })
}

/// Geographic bounding box of a grid, from points along its four edges.
fn geographic_footprint(
    grid: &CategoricalGrid,
    proj: &dyn MapProjection,
) -> Result<BoundingBox> {
    let (w, h) = (grid.width as f64, grid.height as f64);
    let mut points = Vec::with_capacity(EDGE_SAMPLES * 4 + 4);

    for i in 0..=EDGE_SAMPLES {
        let t = i as f64 / EDGE_SAMPLES as f64;
        for (col, row) in [(t * w, 0.0), (t * w, h), (0.0, t * h), (w, t * h)] {
            let (x, y) = grid.transform.apply(col, row);
            if let Some(lonlat) = proj.inverse(x, y) {
                points.push(lonlat);
            }
        }
    }

    BoundingBox::from_points(points)
        .filter(|b| b.width() > 0.0 && b.height() > 0.0)
        .ok_or(GridProcessorError::EmptyFootprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use landcover_common::SinusoidalParams;
    use projection::Sinusoidal;

    /// A small MODIS-style sinusoidal grid just north of the equator.
    fn sinusoidal_grid() -> CategoricalGrid {
        let (width, height) = (40, 20);
        let pixel = 463.312_716_527_916_7;
        let data = (0..width * height)
            .map(|i| if (i % width) < width / 2 { 10 } else { 12 })
            .collect();
        CategoricalGrid::new(
            width,
            height,
            data,
            GeoTransform::north_up(1_000_000.0, 1_200_000.0, pixel, pixel),
            CrsCode::Sinusoidal(SinusoidalParams::modis()),
        )
        .unwrap()
    }

    #[test]
    fn test_wgs84_passthrough() {
        let grid = CategoricalGrid::new(
            2,
            1,
            vec![3, 4],
            GeoTransform::north_up(0.0, 1.0, 1.0, 1.0),
            CrsCode::Epsg4326,
        )
        .unwrap();
        assert_eq!(reproject_to_wgs84(&grid, ResamplingMethod::Nearest).unwrap(), grid);
    }

    #[test]
    fn test_rejects_blending() {
        let grid = sinusoidal_grid();
        assert!(matches!(
            reproject_to_wgs84(&grid, ResamplingMethod::Cubic),
            Err(GridProcessorError::BlendingResampling(_))
        ));
    }

    #[test]
    fn test_sinusoidal_to_wgs84() {
        let grid = sinusoidal_grid();
        let out = reproject_to_wgs84(&grid, ResamplingMethod::Nearest).unwrap();

        assert_eq!(out.crs, CrsCode::Epsg4326);
        assert_eq!((out.width, out.height), (grid.width, grid.height));

        // Only codes from the source (or no-data) appear.
        assert!(out.data.iter().all(|&c| c == 10 || c == 12 || c == NO_DATA_CODE));
        assert!(out.data.contains(&10));
        assert!(out.data.contains(&12));

        // Footprint contains the projected grid centre.
        let b = grid.bounds();
        let (cx, cy) = b.center();
        let (lon, lat) = Sinusoidal::modis().inverse(cx, cy).unwrap();
        assert!(out.bounds().contains_point(lon, lat));
    }

    #[test]
    fn test_unsupported_crs() {
        let mut grid = sinusoidal_grid();
        grid.crs = CrsCode::Epsg(32633);
        assert!(matches!(
            reproject_to_wgs84(&grid, ResamplingMethod::Nearest),
            Err(GridProcessorError::ProjectionError(_))
        ));
    }
}
