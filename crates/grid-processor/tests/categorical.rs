//! Display preparation must never invent class codes.

use std::collections::BTreeSet;

use grid_processor::{CategoricalGrid, ResamplingMethod};
use landcover_common::{CrsCode, GeoTransform, SinusoidalParams};
use test_utils::{count_code, quadrant_grid, scattered_grid, MODIS_PIXEL_SIZE, NO_DATA};

fn codes(data: &[u8]) -> BTreeSet<u8> {
    data.iter().copied().collect()
}

fn modis_grid(width: usize, height: usize, data: Vec<u8>) -> CategoricalGrid {
    // Upper-left corner of MODIS tile h10v05
    CategoricalGrid::new(
        width,
        height,
        data,
        GeoTransform::north_up(
            -8_895_604.157_333,
            4_447_802.078_667,
            MODIS_PIXEL_SIZE,
            MODIS_PIXEL_SIZE,
        ),
        CrsCode::Sinusoidal(SinusoidalParams::modis()),
    )
    .unwrap()
}

#[test]
fn reprojection_only_copies_codes() {
    let data = scattered_grid(60, 40, 11);
    let source_no_data = count_code(&data, NO_DATA);
    let input = codes(&data);
    let grid = modis_grid(60, 40, data);

    let out = grid.reproject_to_wgs84(ResamplingMethod::Nearest).unwrap();
    assert_eq!((out.width, out.height), (60, 40));
    assert!(out.crs.is_wgs84());
    for code in codes(&out.data) {
        assert!(code == NO_DATA || input.contains(&code), "invented code {}", code);
    }

    // Most of the footprint is covered by source cells
    assert!(count_code(&out.data, NO_DATA) < source_no_data + (60 * 40) / 2);

    let bounds = out.bounds();
    assert!((bounds.max_y - 40.0).abs() < 1e-3 && bounds.min_y > 39.0);
    assert!(bounds.max_x < -100.0);
}

#[test]
fn blending_methods_are_refused() {
    let grid = modis_grid(4, 4, vec![12; 16]);
    assert!(grid.reproject_to_wgs84(ResamplingMethod::Bilinear).is_err());
    assert!(grid.reproject_to_wgs84(ResamplingMethod::Cubic).is_err());
}

#[test]
fn downsampling_keeps_extent_and_codes() {
    let data = quadrant_grid(3000, 2000, [12, 10, 5, NO_DATA]);
    let grid = CategoricalGrid::new(
        3000,
        2000,
        data,
        GeoTransform::north_up(-100.0, 40.0, 0.001, 0.001),
        CrsCode::Epsg4326,
    )
    .unwrap();

    let small = grid.downsampled(1024);
    assert_eq!((small.width, small.height), (1000, 667));
    assert_eq!(codes(&small.data), codes(&grid.data));
    // Quadrants stay proportionate
    assert_eq!(count_code(&small.data, 12), 500 * 334);

    let b = small.bounds();
    assert!((b.min_x - -100.0).abs() < 1e-9);
    assert!((b.max_y - 40.0).abs() < 1e-9);
    assert!((b.max_x - -97.0).abs() < 1e-9);
}
