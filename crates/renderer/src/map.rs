//! Static map figures and transparent overlays of category masks.
//!
//! Grids arrive already downsampled; each panel is painted cell-for-cell
//! into a PNG and embedded in an SVG figure that adds the title, extent
//! labels and legend.

use landcover_common::{BoundingBox, NO_DATA_CODE};

use crate::colormap::{render_change, render_mask, ChangeStyle, Color, MaskStyle, SequentialScale};
use crate::error::RenderError;
use crate::png::{encode_rgba, TITLE_KEYWORD};
use crate::svg::{Anchor, SvgCanvas};
use crate::RenderedImage;

const FIGURE_WIDTH: f64 = 900.0;
const MAX_PANEL_HEIGHT: f64 = 520.0;
const MARGIN: f64 = 50.0;
const PANEL_GAP: f64 = 30.0;
const TITLE_BAND: f64 = 60.0;
const LEGEND_BAND: f64 = 70.0;

/// A read-only view of a category grid with its extent.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
    pub codes: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub extent: BoundingBox,
    /// Extent is in degrees rather than projected meters.
    pub geographic: bool,
}

impl<'a> GridView<'a> {
    fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 || self.codes.len() != self.width * self.height {
            return Err(RenderError::InvalidInput(format!(
                "{} cells cannot form a {}x{} grid",
                self.codes.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    fn aspect(&self) -> f64 {
        self.height as f64 / self.width as f64
    }
}

/// One panel of a map figure.
struct Panel {
    label: String,
    png: Vec<u8>,
    aspect: f64,
    extent: BoundingBox,
    geographic: bool,
}

fn coordinate_label(value: f64, is_lon: bool, geographic: bool) -> String {
    if !geographic {
        return format!("{:.0} m", value);
    }
    let hemi = match (is_lon, value < 0.0) {
        (true, true) => 'W',
        (true, false) => 'E',
        (false, true) => 'S',
        (false, false) => 'N',
    };
    format!("{:.2}°{}", value.abs(), hemi)
}

/// Lay out panels side by side under a title with a legend strip.
fn compose(
    title: &str,
    panels: &[Panel],
    legend: &[(Color, String)],
) -> Result<RenderedImage, RenderError> {
    if panels.is_empty() {
        return Err(RenderError::InvalidInput("map figure has no panels".into()));
    }

    let n = panels.len() as f64;
    let slot_width = (FIGURE_WIDTH - 2.0 * MARGIN - PANEL_GAP * (n - 1.0)) / n;
    let max_aspect = panels.iter().map(|p| p.aspect).fold(0.0, f64::max);
    let panel_height = (slot_width * max_aspect).min(MAX_PANEL_HEIGHT);
    let height = (TITLE_BAND + panel_height + 40.0 + LEGEND_BAND).ceil();

    let mut canvas = SvgCanvas::new(FIGURE_WIDTH as u32, height as u32);
    canvas.text(FIGURE_WIDTH / 2.0, 32.0, 18.0, Anchor::Middle, title);

    for (i, panel) in panels.iter().enumerate() {
        // Fit the panel inside its slot keeping the grid's aspect ratio.
        let (mut w, mut h) = (slot_width, slot_width * panel.aspect);
        if h > panel_height {
            h = panel_height;
            w = h / panel.aspect;
        }
        let x = MARGIN + i as f64 * (slot_width + PANEL_GAP) + (slot_width - w) / 2.0;
        let y = TITLE_BAND;

        if panels.len() > 1 {
            canvas.text(x + w / 2.0, y - 8.0, 14.0, Anchor::Middle, &panel.label);
        }
        canvas.png_image(x, y, w, h, &panel.png);
        canvas.rect(x, y, w, h, Color::transparent(), Some(Color::rgb(80, 80, 80)));

        let e = &panel.extent;
        let label = |value: f64, is_lon: bool| coordinate_label(value, is_lon, panel.geographic);
        canvas.text(x, y + h + 16.0, 10.0, Anchor::Start, &label(e.min_x, true));
        canvas.text(x + w, y + h + 16.0, 10.0, Anchor::End, &label(e.max_x, true));
        canvas.text(x - 4.0, y + 10.0, 10.0, Anchor::End, &label(e.max_y, false));
        canvas.text(x - 4.0, y + h, 10.0, Anchor::End, &label(e.min_y, false));
    }

    let legend_y = TITLE_BAND + panel_height + 50.0;
    let mut x = MARGIN;
    for (color, label) in legend {
        canvas.rect(x, legend_y, 16.0, 16.0, *color, Some(Color::rgb(120, 120, 120)));
        canvas.text(x + 22.0, legend_y + 13.0, 12.0, Anchor::Start, label);
        x += 40.0 + label.chars().count() as f64 * 7.0;
    }

    canvas.render(title)
}

fn mask_panel(
    label: String,
    grid: &GridView<'_>,
    code: u8,
    style: &MaskStyle,
) -> Result<Panel, RenderError> {
    grid.validate()?;
    let pixels = render_mask(grid.codes, grid.width, code, NO_DATA_CODE, style);
    Ok(Panel {
        label,
        png: encode_rgba(&pixels, grid.width, grid.height, &[])?,
        aspect: grid.aspect(),
        extent: grid.extent,
        geographic: grid.geographic,
    })
}

fn mask_legend(style: &MaskStyle, category: &str) -> Vec<(Color, String)> {
    vec![
        (style.present, category.to_string()),
        (style.absent, "Other land cover".to_string()),
        (style.no_data, "No data".to_string()),
    ]
}

/// Category mask over the raster extent with the fixed sequential scale.
pub fn render_choropleth(
    title: &str,
    grid: &GridView<'_>,
    code: u8,
    category: &str,
) -> Result<RenderedImage, RenderError> {
    let style = MaskStyle::choropleth(&SequentialScale::viridis());
    let panel = mask_panel(String::new(), grid, code, &style)?;
    compose(title, &[panel], &mask_legend(&style, category))
}

/// One mask panel per labelled grid, in the given order.
pub fn render_side_by_side(
    title: &str,
    grids: &[(String, GridView<'_>)],
    code: u8,
    category: &str,
) -> Result<RenderedImage, RenderError> {
    let style = MaskStyle::choropleth(&SequentialScale::viridis());
    let panels = grids
        .iter()
        .map(|(label, grid)| mask_panel(label.clone(), grid, code, &style))
        .collect::<Result<Vec<_>, _>>()?;
    compose(title, &panels, &mask_legend(&style, category))
}

/// Gained, lost and stable cells of `code` between two grids.
pub fn render_change_map(
    title: &str,
    first: &GridView<'_>,
    second: &GridView<'_>,
    code: u8,
) -> Result<RenderedImage, RenderError> {
    first.validate()?;
    second.validate()?;
    if (first.width, first.height) != (second.width, second.height) {
        return Err(RenderError::ShapeMismatch(
            first.width,
            first.height,
            second.width,
            second.height,
        ));
    }

    let style = ChangeStyle::default();
    let pixels = render_change(first.codes, second.codes, code, NO_DATA_CODE, &style);
    let panel = Panel {
        label: String::new(),
        png: encode_rgba(&pixels, first.width, first.height, &[])?,
        aspect: first.aspect(),
        extent: first.extent,
        geographic: first.geographic,
    };
    let legend = vec![
        (style.gained, "Gained".to_string()),
        (style.lost, "Lost".to_string()),
        (style.stable, "Unchanged".to_string()),
        (style.no_data, "No data".to_string()),
    ];
    compose(title, &[panel], &legend)
}

/// Transparent PNG of the category cells, one image pixel per grid cell,
/// for placement on a web basemap.
pub fn render_overlay(
    title: &str,
    grid: &GridView<'_>,
    code: u8,
) -> Result<RenderedImage, RenderError> {
    grid.validate()?;
    let style = MaskStyle::overlay(&SequentialScale::viridis());
    let pixels = render_mask(grid.codes, grid.width, code, NO_DATA_CODE, &style);
    Ok(RenderedImage {
        png: encode_rgba(&pixels, grid.width, grid.height, &[(TITLE_KEYWORD, title)])?,
        width: grid.width as u32,
        height: grid.height as u32,
    })
}
