//! Visualization Dispatcher.
//!
//! Planning turns a [`VisualizationKind`] plus the request's metrics and
//! display grids into zero or more [`VisualizationSpec`]s, each carrying
//! exactly the inputs its renderer needs. Rendering is a pure function of
//! a spec, so specs are rendered in parallel and a failing spec only drops
//! its own artifact.

use grid_processor::CategoricalGrid;
use landcover_common::{
    ArtifactDetails, BoundingBox, Category, MapPlacement, VisualizationKind, NO_DATA_CODE,
};
use rayon::prelude::*;
use renderer::{
    render_change_map, render_choropleth, render_overlay, render_side_by_side, BarChart,
    GridView, LineChart, PieChart, RenderError, RenderedImage, Series,
};
use tracing::{debug, warn};

use crate::metrics::MetricsTable;

const YEAR_AXIS: &str = "Year";
const AREA_AXIS: &str = "Area (km²)";

/// One year's grid prepared for display, in WGS84 when reprojection
/// succeeded and in its native CRS otherwise.
#[derive(Debug, Clone)]
pub struct MapLayer {
    pub year: i32,
    pub grid: CategoricalGrid,
}

/// A category's value per available year.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub category: Category,
    /// `(year, area km²)`, ascending by year
    pub points: Vec<(i32, f64)>,
}

/// A visualization kind bound to its inputs.
#[derive(Debug, Clone)]
pub enum VisualizationSpec {
    LineChart {
        series: Vec<CategorySeries>,
    },
    BarChart {
        series: Vec<CategorySeries>,
    },
    PieChart {
        year: i32,
        /// `(label, area km²)`, remainder of classified land last
        slices: Vec<(String, f64)>,
    },
    ChoroplethMap {
        year: i32,
        category: Category,
        grid: CategoricalGrid,
    },
    OverlayMap {
        year: i32,
        category: Category,
        grid: CategoricalGrid,
    },
    ChangeMap {
        from_year: i32,
        to_year: i32,
        category: Category,
        first: CategoricalGrid,
        second: CategoricalGrid,
    },
    SideBySideMaps {
        category: Category,
        panels: Vec<(i32, CategoricalGrid)>,
    },
}

/// Inputs shared by every planned visualization of one request.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub categories: &'a [Category],
    pub metrics: &'a MetricsTable,
    /// Display grids of the available years, ascending
    pub layers: &'a [MapLayer],
    pub pixel_area_km2: f64,
    pub max_map_dim: usize,
    pub max_overlay_dim: usize,
}

impl<'a> PlanContext<'a> {
    fn primary(&self) -> Option<&'a Category> {
        self.categories.first()
    }

    fn series(&self) -> Vec<CategorySeries> {
        self.categories
            .iter()
            .map(|category| CategorySeries {
                category: category.clone(),
                points: self.metrics.series(category.code),
            })
            .collect()
    }
}

/// Specs for one kind. Map kinds produce nothing without display grids;
/// `ChoroplethMap` and `OverlayMap` produce one spec per available year.
pub fn plan_visualization(
    kind: VisualizationKind,
    ctx: &PlanContext<'_>,
) -> Vec<VisualizationSpec> {
    let Some(primary) = ctx.primary() else {
        return Vec::new();
    };

    match kind {
        VisualizationKind::LineChart => vec![VisualizationSpec::LineChart {
            series: ctx.series(),
        }],
        VisualizationKind::BarChart => vec![VisualizationSpec::BarChart {
            series: ctx.series(),
        }],
        VisualizationKind::PieChart => {
            let Some(&year) = ctx.metrics.available_years().first() else {
                return Vec::new();
            };
            let mut slices = Vec::with_capacity(ctx.categories.len() + 1);
            let mut covered = 0u64;
            // Shares of classified land; no-data cells are not part of it
            for category in ctx.categories.iter().filter(|c| c.code != NO_DATA_CODE) {
                if let Some(m) = ctx.metrics.get(year, category.code) {
                    covered += m.pixel_count;
                    slices.push((category.label.clone(), m.area_km2));
                }
            }
            let valid = ctx.metrics.valid_pixels(year).unwrap_or(covered);
            let other = valid.saturating_sub(covered);
            if other > 0 {
                slices.push(("Other".to_string(), other as f64 * ctx.pixel_area_km2));
            }
            vec![VisualizationSpec::PieChart { year, slices }]
        }
        VisualizationKind::ChoroplethMap => ctx
            .layers
            .iter()
            .map(|layer| VisualizationSpec::ChoroplethMap {
                year: layer.year,
                category: primary.clone(),
                grid: layer.grid.downsampled(ctx.max_map_dim),
            })
            .collect(),
        VisualizationKind::OverlayMap => ctx
            .layers
            .iter()
            .map(|layer| VisualizationSpec::OverlayMap {
                year: layer.year,
                category: primary.clone(),
                grid: layer.grid.downsampled(ctx.max_overlay_dim),
            })
            .collect(),
        VisualizationKind::ChangeMap => match (ctx.layers.first(), ctx.layers.last()) {
            (Some(first), Some(last)) if ctx.layers.len() >= 2 => {
                vec![VisualizationSpec::ChangeMap {
                    from_year: first.year,
                    to_year: last.year,
                    category: primary.clone(),
                    first: first.grid.downsampled(ctx.max_map_dim),
                    second: last.grid.downsampled(ctx.max_map_dim),
                }]
            }
            _ => {
                debug!(layers = ctx.layers.len(), "Change map needs two years with data");
                Vec::new()
            }
        },
        VisualizationKind::SideBySideMaps => {
            if ctx.layers.is_empty() {
                return Vec::new();
            }
            vec![VisualizationSpec::SideBySideMaps {
                category: primary.clone(),
                panels: ctx
                    .layers
                    .iter()
                    .map(|layer| (layer.year, layer.grid.downsampled(ctx.max_map_dim)))
                    .collect(),
            }]
        }
    }
}

fn grid_view(grid: &CategoricalGrid) -> GridView<'_> {
    GridView {
        codes: &grid.data,
        width: grid.width,
        height: grid.height,
        extent: grid.bounds(),
        geographic: grid.crs.is_geographic(),
    }
}

fn chart_series(series: &[CategorySeries]) -> Vec<Series> {
    series
        .iter()
        .map(|s| {
            s.points.iter().fold(Series::new(s.category.label.clone()), |acc, (year, area)| {
                acc.point(year.to_string(), *area)
            })
        })
        .collect()
}

fn series_title(
    series: &[CategorySeries],
    single: impl Fn(&Category) -> String,
    multi: &str,
) -> String {
    match series {
        [only] => single(&only.category),
        _ => multi.to_string(),
    }
}

/// Suggested web-map zoom at which `bounds` roughly fills a 256 px tile.
pub fn suggested_zoom(bounds: &BoundingBox) -> u8 {
    let span = bounds.width().max(bounds.height());
    if !(span.is_finite() && span > 0.0) {
        return 1;
    }
    (360.0 / span).log2().floor().clamp(1.0, 18.0) as u8
}

/// Basemap placement for a WGS84 overlay grid.
pub fn map_placement(grid: &CategoricalGrid) -> Option<MapPlacement> {
    if !grid.crs.is_wgs84() {
        return None;
    }
    let bounds = grid.bounds();
    let (center_lon, center_lat) = bounds.center();
    Some(MapPlacement {
        bounds,
        center_lon,
        center_lat,
        zoom: suggested_zoom(&bounds),
    })
}

/// A rendered visualization with its metadata.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: VisualizationKind,
    pub title: String,
    pub image: RenderedImage,
    pub placement: Option<MapPlacement>,
}

impl Artifact {
    pub fn details(&self) -> ArtifactDetails {
        ArtifactDetails {
            kind: self.kind,
            title: self.title.clone(),
            media_type: RenderedImage::MEDIA_TYPE.to_string(),
            width: self.image.width,
            height: self.image.height,
            placement: self.placement,
        }
    }
}

impl VisualizationSpec {
    pub fn kind(&self) -> VisualizationKind {
        match self {
            Self::LineChart { .. } => VisualizationKind::LineChart,
            Self::BarChart { .. } => VisualizationKind::BarChart,
            Self::PieChart { .. } => VisualizationKind::PieChart,
            Self::ChoroplethMap { .. } => VisualizationKind::ChoroplethMap,
            Self::OverlayMap { .. } => VisualizationKind::OverlayMap,
            Self::ChangeMap { .. } => VisualizationKind::ChangeMap,
            Self::SideBySideMaps { .. } => VisualizationKind::SideBySideMaps,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::LineChart { series } => series_title(
                series,
                |c| format!("Trend of {} Area", c.name),
                "Trend of Land Cover Area",
            ),
            Self::BarChart { series } => series_title(
                series,
                |c| format!("{} Area by Year", c.name),
                "Land Cover Area by Year",
            ),
            Self::PieChart { year, .. } => format!("Land Cover Share in {}", year),
            Self::ChoroplethMap { year, category, .. } => {
                format!("{} Distribution for {}", category.name, year)
            }
            Self::OverlayMap { year, category, .. } => {
                format!("{} Overlay for {}", category.name, year)
            }
            Self::ChangeMap {
                from_year,
                to_year,
                category,
                ..
            } => format!("Change in {} Between {} and {}", category.name, from_year, to_year),
            Self::SideBySideMaps { category, panels } => {
                let years: Vec<String> = panels.iter().map(|(y, _)| y.to_string()).collect();
                format!("{} in {}", category.name, years.join(" and "))
            }
        }
    }

    /// Number of plotted chart points; zero for maps.
    pub fn point_count(&self) -> usize {
        match self {
            Self::LineChart { series } | Self::BarChart { series } => {
                series.iter().map(|s| s.points.len()).sum()
            }
            Self::PieChart { slices, .. } => slices.len(),
            _ => 0,
        }
    }

    /// Render to a PNG artifact.
    pub fn render(&self) -> Result<Artifact, RenderError> {
        let title = self.title();
        let mut placement = None;

        let image = match self {
            Self::LineChart { series } => LineChart {
                title: title.clone(),
                x_label: YEAR_AXIS.into(),
                y_label: AREA_AXIS.into(),
                series: chart_series(series),
            }
            .render()?,
            Self::BarChart { series } => BarChart {
                title: title.clone(),
                x_label: YEAR_AXIS.into(),
                y_label: AREA_AXIS.into(),
                series: chart_series(series),
            }
            .render()?,
            Self::PieChart { slices, .. } => PieChart {
                title: title.clone(),
                slices: slices.clone(),
            }
            .render()?,
            Self::ChoroplethMap { category, grid, .. } => {
                render_choropleth(&title, &grid_view(grid), category.code, &category.label)?
            }
            Self::OverlayMap { category, grid, .. } => {
                placement = map_placement(grid);
                render_overlay(&title, &grid_view(grid), category.code)?
            }
            Self::ChangeMap {
                category,
                first,
                second,
                ..
            } => render_change_map(&title, &grid_view(first), &grid_view(second), category.code)?,
            Self::SideBySideMaps { category, panels } => {
                let views: Vec<(String, GridView<'_>)> = panels
                    .iter()
                    .map(|(year, grid)| (year.to_string(), grid_view(grid)))
                    .collect();
                render_side_by_side(&title, &views, category.code, &category.label)?
            }
        };

        Ok(Artifact {
            kind: self.kind(),
            title,
            image,
            placement,
        })
    }
}

/// Renders specs independently, keeping successful artifacts in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualizationDispatcher;

impl VisualizationDispatcher {
    pub fn render_all(&self, specs: &[VisualizationSpec]) -> Vec<Artifact> {
        specs
            .par_iter()
            .map(|spec| match spec.render() {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    warn!(
                        kind = %spec.kind(),
                        title = %spec.title(),
                        error = %e,
                        "Visualization failed; omitting it"
                    );
                    ::metrics::counter!(
                        "landcover_render_failures_total",
                        "kind" => spec.kind().as_str()
                    )
                    .increment(1);
                    None
                }
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsEngine, YearMetrics};
    use geotiff_reader::RasterFrame;
    use landcover_common::{CrsCode, GeoTransform};
    use std::path::PathBuf;

    fn grid(data: Vec<u8>, width: usize) -> CategoricalGrid {
        let height = data.len() / width;
        CategoricalGrid::new(
            width,
            height,
            data,
            GeoTransform::north_up(-100.0, 40.0, 0.5, 0.5),
            CrsCode::Epsg4326,
        )
        .unwrap()
    }

    fn croplands() -> Category {
        Category::new(12, "croplands", "Croplands")
    }

    fn table(years: &[(i32, Option<Vec<u8>>)]) -> MetricsTable {
        let engine = MetricsEngine::default();
        let cats = vec![croplands()];
        MetricsTable::new(
            years
                .iter()
                .map(|(year, data)| match data {
                    Some(d) => engine.measure_year(
                        &RasterFrame {
                            year: *year,
                            path: PathBuf::new(),
                            grid: grid(d.clone(), 2),
                        },
                        &cats,
                    ),
                    None => YearMetrics::Missing { year: *year },
                })
                .collect(),
        )
    }

    fn ctx<'a>(
        cats: &'a [Category],
        metrics: &'a MetricsTable,
        layers: &'a [MapLayer],
    ) -> PlanContext<'a> {
        PlanContext {
            categories: cats,
            metrics,
            layers,
            pixel_area_km2: 0.25,
            max_map_dim: 800,
            max_overlay_dim: 2,
        }
    }

    #[test]
    fn test_line_chart_skips_missing_year() {
        let cats = vec![croplands()];
        let metrics = table(&[(2015, Some(vec![12, 12, 0, 0])), (2099, None)]);
        let specs = plan_visualization(VisualizationKind::LineChart, &ctx(&cats, &metrics, &[]));
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].point_count(), 1);
        match &specs[0] {
            VisualizationSpec::LineChart { series } => {
                assert_eq!(series[0].points, vec![(2015, 0.5)])
            }
            other => panic!("unexpected spec {:?}", other.kind()),
        }
    }

    #[test]
    fn test_pie_adds_other_slice() {
        let cats = vec![croplands()];
        let metrics = table(&[(2015, Some(vec![12, 10, 10, 255]))]);
        let specs = plan_visualization(VisualizationKind::PieChart, &ctx(&cats, &metrics, &[]));
        match &specs[0] {
            VisualizationSpec::PieChart { year, slices } => {
                assert_eq!(*year, 2015);
                assert_eq!(
                    slices,
                    &vec![("Croplands".to_string(), 0.25), ("Other".to_string(), 0.5)]
                );
            }
            other => panic!("unexpected spec {:?}", other.kind()),
        }
    }

    #[test]
    fn test_pie_leaves_out_no_data() {
        let cats = vec![Category::new(NO_DATA_CODE, "no_data", "No Data"), croplands()];
        let frame = RasterFrame {
            year: 2015,
            path: PathBuf::new(),
            grid: grid(vec![255, 255, 12, 10], 2),
        };
        let metrics = MetricsTable::new(vec![MetricsEngine::default().measure_year(&frame, &cats)]);
        let specs = plan_visualization(VisualizationKind::PieChart, &ctx(&cats, &metrics, &[]));
        match &specs[0] {
            VisualizationSpec::PieChart { slices, .. } => assert_eq!(
                slices,
                &vec![("Croplands".to_string(), 0.25), ("Other".to_string(), 0.25)]
            ),
            other => panic!("unexpected spec {:?}", other.kind()),
        }
    }

    #[test]
    fn test_overlay_is_downsampled_and_placed() {
        let cats = vec![croplands()];
        let metrics = table(&[(2015, Some(vec![12; 16]))]);
        let layers = vec![MapLayer {
            year: 2015,
            grid: grid(vec![12; 16], 4),
        }];
        let specs =
            plan_visualization(VisualizationKind::OverlayMap, &ctx(&cats, &metrics, &layers));
        let VisualizationSpec::OverlayMap { grid, .. } = &specs[0] else {
            panic!("expected overlay");
        };
        assert_eq!((grid.width, grid.height), (2, 2));

        let artifact = specs[0].render().unwrap();
        assert_eq!(artifact.title, "croplands Overlay for 2015");
        let placement = artifact.placement.unwrap();
        assert_eq!((placement.center_lon, placement.center_lat), (-99.0, 39.0));
    }

    #[test]
    fn test_change_map_needs_two_layers() {
        let cats = vec![croplands()];
        let metrics = table(&[(2015, Some(vec![12; 4]))]);
        let layers = vec![MapLayer {
            year: 2015,
            grid: grid(vec![12; 4], 2),
        }];
        let specs =
            plan_visualization(VisualizationKind::ChangeMap, &ctx(&cats, &metrics, &layers));
        assert!(specs.is_empty());
    }

    #[test]
    fn test_render_failure_is_omitted() {
        let good = VisualizationSpec::BarChart {
            series: vec![CategorySeries {
                category: croplands(),
                points: vec![(2015, 1.0)],
            }],
        };
        let bad = VisualizationSpec::ChangeMap {
            from_year: 2015,
            to_year: 2020,
            category: croplands(),
            first: grid(vec![12; 4], 2),
            second: grid(vec![12; 6], 3),
        };
        let artifacts = VisualizationDispatcher.render_all(&[bad, good]);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].kind, VisualizationKind::BarChart);
        assert_eq!(artifacts[0].image.title().as_deref(), Some("croplands Area by Year"));
    }

    #[test]
    fn test_suggested_zoom() {
        assert_eq!(suggested_zoom(&BoundingBox::new(-180.0, -90.0, 180.0, 90.0)), 1);
        assert_eq!(suggested_zoom(&BoundingBox::new(-100.0, 39.0, -99.0, 40.0)), 8);
    }
}
