//! Category Metrics Engine: pixel counts and areas per (year, category).
//!
//! Areas are always `pixel_count * pixel_area_km2` with a fixed per-pixel
//! area; raster resolution is not consulted. The unrounded area is kept and
//! only [`CategoryMetrics::area_rounded`] rounds to two decimals.

use geotiff_reader::RasterFrame;
use landcover_common::{Category, NO_DATA_CODE};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PIXEL_AREA_KM2;

/// Cells per parallel counting task.
const COUNT_CHUNK: usize = 64 * 1024;

/// Area statistics for one category in one year's raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetrics {
    pub year: i32,
    pub category: Category,
    /// Exact number of cells holding the category code
    pub pixel_count: u64,
    /// Unrounded area in km²
    pub area_km2: f64,
}

impl CategoryMetrics {
    /// Area rounded to two decimals.
    pub fn area_rounded(&self) -> f64 {
        round2(self.area_km2)
    }

    /// Area formatted with two decimals, e.g. `"12.25"`.
    pub fn area_display(&self) -> String {
        format!("{:.2}", self.area_km2)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Number of cells equal to `code`.
pub fn count_code(codes: &[u8], code: u8) -> u64 {
    codes
        .par_chunks(COUNT_CHUNK)
        .map(|chunk| chunk.iter().filter(|&&c| c == code).count() as u64)
        .sum()
}

/// Number of classified cells (anything but no-data).
pub fn valid_pixel_count(codes: &[u8]) -> u64 {
    codes
        .par_chunks(COUNT_CHUNK)
        .map(|chunk| chunk.iter().filter(|&&c| c != NO_DATA_CODE).count() as u64)
        .sum()
}

/// Converts category masks into areas with a fixed per-pixel area.
#[derive(Debug, Clone, Copy)]
pub struct MetricsEngine {
    pixel_area_km2: f64,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PIXEL_AREA_KM2)
    }
}

impl MetricsEngine {
    pub fn new(pixel_area_km2: f64) -> Self {
        Self { pixel_area_km2 }
    }

    pub fn pixel_area_km2(&self) -> f64 {
        self.pixel_area_km2
    }

    /// Count cells of `category` in `frame`. An absent category is a zero
    /// count, not an error.
    pub fn compute(&self, frame: &RasterFrame, category: &Category) -> CategoryMetrics {
        let pixel_count = count_code(frame.codes(), category.code);
        CategoryMetrics {
            year: frame.year,
            category: category.clone(),
            pixel_count,
            area_km2: pixel_count as f64 * self.pixel_area_km2,
        }
    }

    /// Metrics for every requested category in one frame.
    pub fn measure_year(&self, frame: &RasterFrame, categories: &[Category]) -> YearMetrics {
        YearMetrics::Available {
            year: frame.year,
            total_pixels: frame.codes().len() as u64,
            valid_pixels: valid_pixel_count(frame.codes()),
            categories: categories.iter().map(|c| self.compute(frame, c)).collect(),
        }
    }
}

/// Metrics for one requested year, or a marker that its raster was absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum YearMetrics {
    Available {
        year: i32,
        /// All cells in the frame, no-data included
        total_pixels: u64,
        /// Classified cells in the frame
        valid_pixels: u64,
        categories: Vec<CategoryMetrics>,
    },
    Missing {
        year: i32,
    },
}

impl YearMetrics {
    pub fn year(&self) -> i32 {
        match self {
            YearMetrics::Available { year, .. } | YearMetrics::Missing { year } => *year,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, YearMetrics::Missing { .. })
    }
}

/// Change in a category's area between two years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaChange {
    pub from_year: i32,
    pub to_year: i32,
    pub from_km2: f64,
    pub to_km2: f64,
    pub delta_km2: f64,
    /// Relative change; `None` when the starting area is zero
    pub percent: Option<f64>,
}

/// All metrics of one query, in request year order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    entries: Vec<YearMetrics>,
}

impl MetricsTable {
    pub fn new(entries: Vec<YearMetrics>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[YearMetrics] {
        &self.entries
    }

    /// Years whose raster was read, ascending.
    pub fn available_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .entries
            .iter()
            .filter(|e| !e.is_missing())
            .map(YearMetrics::year)
            .collect();
        years.sort_unstable();
        years
    }

    /// Years whose raster was absent, in request order.
    pub fn missing_years(&self) -> Vec<i32> {
        self.entries
            .iter()
            .filter(|e| e.is_missing())
            .map(YearMetrics::year)
            .collect()
    }

    pub fn all_missing(&self) -> bool {
        self.entries.iter().all(YearMetrics::is_missing)
    }

    /// Metrics for a category code in a year, if that year was available.
    pub fn get(&self, year: i32, code: u8) -> Option<&CategoryMetrics> {
        self.entries.iter().find_map(|e| match e {
            YearMetrics::Available {
                year: y,
                categories,
                ..
            } if *y == year => categories.iter().find(|m| m.category.code == code),
            _ => None,
        })
    }

    /// Classified cells in a year's raster.
    pub fn valid_pixels(&self, year: i32) -> Option<u64> {
        self.entries.iter().find_map(|e| match e {
            YearMetrics::Available {
                year: y,
                valid_pixels,
                ..
            } if *y == year => Some(*valid_pixels),
            _ => None,
        })
    }

    /// Share of a year's raster held by a category, in percent.
    ///
    /// Real classes are measured against classified cells; the no-data
    /// category is measured against every cell, since it is exactly the
    /// cells the classified total leaves out.
    pub fn pixel_share(&self, year: i32, code: u8) -> Option<f64> {
        let m = self.get(year, code)?;
        let denominator = self.entries.iter().find_map(|e| match e {
            YearMetrics::Available {
                year: y,
                total_pixels,
                valid_pixels,
                ..
            } if *y == year => Some(if code == NO_DATA_CODE {
                *total_pixels
            } else {
                *valid_pixels
            }),
            _ => None,
        })?;
        (denominator > 0).then(|| m.pixel_count as f64 / denominator as f64 * 100.0)
    }

    /// `(year, area)` for a category over the available years, ascending.
    /// Missing years contribute no point.
    pub fn series(&self, code: u8) -> Vec<(i32, f64)> {
        self.available_years()
            .into_iter()
            .filter_map(|year| self.get(year, code).map(|m| (year, m.area_km2)))
            .collect()
    }

    /// Area change of a category between two available years.
    pub fn change_between(
        &self,
        from_year: i32,
        to_year: i32,
        code: u8,
    ) -> Option<AreaChange> {
        let from = self.get(from_year, code)?;
        let to = self.get(to_year, code)?;
        let delta = to.area_km2 - from.area_km2;
        Some(AreaChange {
            from_year,
            to_year,
            from_km2: from.area_km2,
            to_km2: to.area_km2,
            delta_km2: delta,
            percent: (from.area_km2 > 0.0).then(|| delta / from.area_km2 * 100.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_processor::CategoricalGrid;
    use landcover_common::{CrsCode, GeoTransform};
    use std::path::PathBuf;

    fn frame(year: i32, data: Vec<u8>, width: usize) -> RasterFrame {
        let height = data.len() / width;
        RasterFrame {
            year,
            path: PathBuf::from(format!("LC_Type1_{year}.tif")),
            grid: CategoricalGrid::new(
                width,
                height,
                data,
                GeoTransform::north_up(-100.0, 40.0, 0.01, 0.01),
                CrsCode::Epsg4326,
            )
            .unwrap(),
        }
    }

    #[test]
    fn test_compute_counts_exact_cells() {
        let engine = MetricsEngine::default();
        let croplands = Category::new(12, "croplands", "Croplands");
        let raster = frame(2015, vec![12, 12, 10, 255, 12, 1], 3);
        let m = engine.compute(&raster, &croplands);
        assert_eq!(m.pixel_count, 3);
        assert_eq!(m.area_km2, 0.75);
        assert_eq!(m.area_display(), "0.75");
    }

    #[test]
    fn test_absent_category_is_zero() {
        let engine = MetricsEngine::default();
        let snow = Category::new(15, "snow_and_ice", "Snow and Ice");
        let m = engine.compute(&frame(2015, vec![1, 2, 3, 4], 2), &snow);
        assert_eq!(m.pixel_count, 0);
        assert_eq!(m.area_rounded(), 0.0);
        assert_eq!(m.area_display(), "0.00");
    }

    #[test]
    fn test_unrounded_area_is_retained() {
        let engine = MetricsEngine::new(0.214_658);
        let forest = Category::new(5, "mixed_forests", "Mixed Forests");
        let m = engine.compute(&frame(2012, vec![5, 5, 5, 0], 2), &forest);
        assert!((m.area_km2 - 0.643_974).abs() < 1e-12);
        assert_eq!(m.area_rounded(), 0.64);
    }

    #[test]
    fn test_parallel_count_matches_sequential() {
        let data: Vec<u8> = (0..300_000u32).map(|i| (i % 17) as u8).collect();
        let expected = data.iter().filter(|&&c| c == 12).count() as u64;
        assert_eq!(count_code(&data, 12), expected);
        assert_eq!(valid_pixel_count(&[1, 255, 3, 255]), 2);
    }

    #[test]
    fn test_table_series_skips_missing_years() {
        let engine = MetricsEngine::default();
        let grass = Category::new(10, "grasslands", "Grasslands");
        let cats = vec![grass];
        let table = MetricsTable::new(vec![
            engine.measure_year(&frame(2020, vec![10, 10, 10, 0], 2), &cats),
            YearMetrics::Missing { year: 2099 },
            engine.measure_year(&frame(2015, vec![10, 0, 0, 0], 2), &cats),
        ]);
        assert_eq!(table.available_years(), vec![2015, 2020]);
        assert_eq!(table.missing_years(), vec![2099]);
        assert_eq!(table.series(10), vec![(2015, 0.25), (2020, 0.75)]);
        assert!(table.get(2099, 10).is_none());
        assert!(!table.all_missing());

        let change = table.change_between(2015, 2020, 10).unwrap();
        assert_eq!(change.delta_km2, 0.5);
        assert_eq!(change.percent, Some(200.0));
        assert!(table.change_between(2015, 2099, 10).is_none());
    }

    #[test]
    fn test_no_data_share_uses_every_cell() {
        let engine = MetricsEngine::default();
        let cats = vec![
            Category::new(NO_DATA_CODE, "no_data", "No Data"),
            Category::new(12, "croplands", "Croplands"),
            Category::new(10, "grasslands", "Grasslands"),
        ];
        // 4 no-data, 3 croplands, 1 grasslands
        let raster = frame(2015, vec![255, 255, 255, 255, 12, 12, 12, 10], 4);
        let table = MetricsTable::new(vec![engine.measure_year(&raster, &cats)]);

        assert_eq!(table.valid_pixels(2015), Some(4));
        assert_eq!(table.pixel_share(2015, NO_DATA_CODE), Some(50.0));
        assert_eq!(table.pixel_share(2015, 12), Some(75.0));
        assert_eq!(table.pixel_share(2015, 10), Some(25.0));
        assert_eq!(table.pixel_share(2099, 12), None);
    }

    #[test]
    fn test_share_of_empty_classified_land_is_none() {
        let engine = MetricsEngine::default();
        let cats = vec![Category::new(12, "croplands", "Croplands")];
        let raster = frame(2015, vec![255; 4], 2);
        let table = MetricsTable::new(vec![engine.measure_year(&raster, &cats)]);
        assert_eq!(table.pixel_share(2015, 12), None);
    }
}
