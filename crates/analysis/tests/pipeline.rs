//! End-to-end query scenarios against GeoTIFF fixtures on disk.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use analysis::{
    AnalysisConfig, QueryOrchestrator, TextSummarizer, VisualizationSpec, FALLBACK_SUMMARY,
};
use async_trait::async_trait;
use base64::Engine;
use geotiff_reader::{GeoTiffDirectory, RasterFrame, RasterResult, RasterSource};
use landcover_common::{Catalog, Query, VisualizationKind};
use test_utils::{
    count_code, landcover_dir, quadrant_grid, scattered_grid, FixtureGeoref, LandcoverDir,
};

/// Wraps a directory source and counts reads.
struct CountingSource {
    inner: GeoTiffDirectory,
    reads: AtomicUsize,
}

impl CountingSource {
    fn new(dir: &LandcoverDir) -> Arc<Self> {
        Arc::new(Self {
            inner: GeoTiffDirectory::new(dir.path()),
            reads: AtomicUsize::new(0),
        })
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl RasterSource for CountingSource {
    fn read(&self, year: i32) -> RasterResult<RasterFrame> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(year)
    }
}

fn orchestrator(source: Arc<CountingSource>) -> QueryOrchestrator {
    QueryOrchestrator::new(Arc::new(Catalog::builtin()), source, AnalysisConfig::default())
}

fn query(intent: &str, variables: &[&str], years: Vec<i32>) -> Query {
    Query::new(intent, variables.iter().map(|s| s.to_string()).collect(), years)
}

fn decode_png(b64: &str) -> image::DynamicImage {
    let bytes = base64::engine::general_purpose::STANDARD.decode(b64).unwrap();
    assert!(!bytes.is_empty());
    assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
    image::load_from_memory(&bytes).unwrap()
}

#[tokio::test]
async fn spatial_distribution_counts_exact_cells() {
    let grid = scattered_grid(40, 30, 7);
    let expected = count_code(&grid, 12);
    let dir = landcover_dir(40, 30, &[(2015, grid)]);
    let source = CountingSource::new(&dir);
    let orch = orchestrator(source.clone());

    let q = query("spatial_distribution", &["croplands"], vec![2015]);
    let validated = orch.validate(&q).unwrap();
    let analysis = orch.analyze(validated);
    let m = analysis.metrics.get(2015, 12).unwrap();
    assert_eq!(m.pixel_count, expected);
    assert_eq!(m.area_rounded(), (expected as f64 * 0.25 * 100.0).round() / 100.0);

    let result = orch.handle(&q).await;
    assert_eq!(result.images.len(), 2);
    assert_eq!(result.captions.len(), 2);
    let titles: Vec<&str> = result.details.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["croplands Distribution for 2015", "croplands Overlay for 2015"]);
    assert_eq!(
        result.captions[0],
        "Spatial distribution of croplands in the selected region and year."
    );
    for image in &result.images {
        decode_png(image);
    }

    let overlay = &result.details[1];
    assert_eq!(overlay.kind, VisualizationKind::OverlayMap);
    assert_eq!((overlay.width, overlay.height), (40, 30));
    let placement = overlay.placement.unwrap();
    assert!((placement.center_lon - -99.8).abs() < 1e-9);
    assert!((placement.center_lat - 39.85).abs() < 1e-9);
    assert_eq!(source.reads(), 2);
}

#[tokio::test]
async fn trend_single_year_has_one_point() {
    let dir = landcover_dir(20, 20, &[(2015, quadrant_grid(20, 20, [10, 12, 10, 5]))]);
    let orch = orchestrator(CountingSource::new(&dir));

    let q = query("trend_analysis", &["grasslands"], vec![2015]);
    let analysis = orch.analyze(orch.validate(&q).unwrap());
    assert_eq!(analysis.specs.len(), 1);
    match &analysis.specs[0] {
        VisualizationSpec::LineChart { series } => {
            assert_eq!(series.len(), 1);
            assert_eq!(series[0].points, vec![(2015, 200.0 * 0.25)]);
        }
        other => panic!("expected a line chart, got {:?}", other.kind()),
    }
    assert_eq!(analysis.artifacts.len(), 1);
}

#[tokio::test]
async fn missing_year_is_skipped_and_noted() {
    let dir = landcover_dir(10, 10, &[(2015, quadrant_grid(10, 10, [12, 12, 10, 5]))]);
    let orch = orchestrator(CountingSource::new(&dir));

    for intent in ["trend_analysis", "change_detection"] {
        let q = query(intent, &["croplands"], vec![2015, 2099]);
        let analysis = orch.analyze(orch.validate(&q).unwrap());
        assert_eq!(analysis.metrics.missing_years(), vec![2099]);
        for spec in &analysis.specs {
            if let VisualizationSpec::LineChart { series }
            | VisualizationSpec::BarChart { series } = spec
            {
                assert_eq!(series[0].points, vec![(2015, 50.0 * 0.25)]);
            }
        }

        let result = orch.handle(&q).await;
        assert!(result.text.contains("No data was found for 2099"), "{}", result.text);
        assert!(result.has_images());
    }
}

#[tokio::test]
async fn all_years_missing_renders_nothing() {
    let dir = LandcoverDir::new().unwrap();
    let orch = orchestrator(CountingSource::new(&dir));

    let result = orch
        .handle(&query("trend_analysis", &["croplands"], vec![2098, 2099]))
        .await;
    assert!(result.images.is_empty());
    assert!(result.text.contains("No land-cover data is available for 2098 and 2099"));
}

#[tokio::test]
async fn validation_failures_do_no_io() {
    let dir = landcover_dir(4, 4, &[(2015, vec![12; 16])]);
    let source = CountingSource::new(&dir);
    let orch = orchestrator(source.clone());

    let result = orch.handle(&query("trend_analysis", &[], vec![2015])).await;
    assert_eq!(result.text, "Please select at least one variable.");
    assert!(result.images.is_empty());

    let result = orch
        .handle(&query("comparison", &["croplands"], vec![2013, 2014, 2015]))
        .await;
    assert_eq!(result.text, "Please select one or two years.");

    let result = orch.handle(&query("", &["croplands"], vec![2015])).await;
    assert_eq!(result.text, "Please select an analysis type.");

    let result = orch.handle(&query("trend_analysis", &["tundra"], vec![2015])).await;
    assert!(result.text.starts_with("Invalid variable: tundra."));

    assert_eq!(source.reads(), 0);
}

#[tokio::test]
async fn comparison_and_change_detection_with_two_years() {
    let first = quadrant_grid(16, 16, [12, 10, 10, 12]);
    let second = quadrant_grid(16, 16, [12, 12, 10, 12]);
    let dir = landcover_dir(16, 16, &[(2015, first), (2020, second)]);
    let orch = orchestrator(CountingSource::new(&dir));

    let result = orch
        .handle(&query("change_detection", &["croplands"], vec![2020, 2015]))
        .await;
    let kinds: Vec<VisualizationKind> = result.details.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![VisualizationKind::ChangeMap, VisualizationKind::BarChart]);
    assert_eq!(result.details[0].title, "Change in croplands Between 2015 and 2020");
    assert!(result
        .text
        .contains("Between 2015 and 2020, Croplands area increased by 16.00 km² (+50.0%)."));

    let result = orch
        .handle(&query("comparison", &["croplands", "grasslands"], vec![2015, 2020]))
        .await;
    let kinds: Vec<VisualizationKind> = result.details.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![VisualizationKind::SideBySideMaps, VisualizationKind::BarChart]);
    for image in &result.images {
        decode_png(image);
    }
}

#[tokio::test]
async fn statistical_summary_pie() {
    let dir = landcover_dir(8, 8, &[(2018, quadrant_grid(8, 8, [12, 10, 255, 5]))]);
    let orch = orchestrator(CountingSource::new(&dir));

    let analysis = orch.analyze(
        orch.validate(&query("statistical_summary", &["croplands"], vec![2018]))
            .unwrap(),
    );
    match &analysis.specs[..] {
        [VisualizationSpec::PieChart { year, slices }] => {
            assert_eq!(*year, 2018);
            assert_eq!(slices[0], ("Croplands".to_string(), 4.0));
            assert_eq!(slices[1], ("Other".to_string(), 8.0));
        }
        other => panic!("unexpected specs: {}", other.len()),
    }
}

#[tokio::test]
async fn sinusoidal_raster_maps_in_wgs84() {
    let dir = LandcoverDir::new().unwrap();
    dir.add_year_with(
        2016,
        24,
        24,
        &quadrant_grid(24, 24, [12, 10, 10, 12]),
        FixtureGeoref::modis(-8_895_604.157_333, 4_447_802.078_667),
    )
    .unwrap();
    let orch = orchestrator(CountingSource::new(&dir));

    let result = orch
        .handle(&query("spatial_distribution", &["croplands"], vec![2016]))
        .await;
    assert_eq!(result.images.len(), 2);
    let placement = result.details[1].placement.expect("overlay placed in WGS84");
    assert!(placement.center_lat > 39.0 && placement.center_lat < 40.0);
    assert!(placement.center_lon < -100.0);
}

struct EchoSummarizer;

#[async_trait]
impl TextSummarizer for EchoSummarizer {
    async fn summarize(
        &self,
        request: &analysis::summarizer::SummaryRequest,
    ) -> Result<String, analysis::SummarizerError> {
        Ok(format!("Prose about {}.", request.variables.join(", ")))
    }
}

struct BrokenSummarizer;

#[async_trait]
impl TextSummarizer for BrokenSummarizer {
    async fn summarize(
        &self,
        _: &analysis::summarizer::SummaryRequest,
    ) -> Result<String, analysis::SummarizerError> {
        Err(analysis::SummarizerError::Status(503))
    }
}

#[tokio::test]
async fn summarizer_prose_and_fallback() {
    let dir = landcover_dir(4, 4, &[(2015, vec![12; 16])]);
    let q = query("trend_analysis", &["croplands"], vec![2015]);

    let orch = orchestrator(CountingSource::new(&dir)).with_summarizer(Arc::new(EchoSummarizer));
    let result = orch.handle(&q).await;
    assert!(result.text.ends_with("\n\nProse about croplands."));

    let orch = orchestrator(CountingSource::new(&dir)).with_summarizer(Arc::new(BrokenSummarizer));
    let result = orch.handle(&q).await;
    assert!(result.text.ends_with(FALLBACK_SUMMARY));
    assert_eq!(result.images.len(), 1);
}

#[tokio::test]
async fn no_data_share_is_measured_against_whole_raster() {
    // Top half no-data, bottom half croplands
    let dir = landcover_dir(10, 10, &[(2015, quadrant_grid(10, 10, [255, 255, 12, 12]))]);
    let orch = orchestrator(CountingSource::new(&dir));

    let q = query("statistical_summary", &["no_data", "croplands"], vec![2015]);
    let analysis = orch.analyze(orch.validate(&q).unwrap());
    assert_eq!(analysis.metrics.pixel_share(2015, 255), Some(50.0));
    assert_eq!(analysis.metrics.pixel_share(2015, 12), Some(100.0));
    match &analysis.specs[0] {
        VisualizationSpec::PieChart { slices, .. } => {
            assert_eq!(slices, &vec![("Croplands".to_string(), 12.5)]);
        }
        other => panic!("expected a pie chart, got {:?}", other.kind()),
    }

    let result = orch.handle(&q).await;
    assert!(result
        .text
        .contains("In 2015, No Data covered 12.50 km² (50 pixels, 50.0% of the raster)."));
    assert!(result
        .text
        .contains("In 2015, Croplands covered 12.50 km² (50 pixels, 100.0% of classified land)."));
}
