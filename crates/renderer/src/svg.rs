//! SVG figure composition and rasterisation.
//!
//! Charts and map figures are written as SVG text and rasterised through
//! resvg onto a tiny-skia pixmap. Text uses whatever system fonts are
//! installed; on a host without fonts the labels are simply not drawn.

use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use base64::Engine;

use crate::colormap::Color;
use crate::error::RenderError;
use crate::png::{encode_rgba, TITLE_KEYWORD};
use crate::RenderedImage;

/// Font family requested for all figure text.
const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";

/// Fill for all figure text.
const TEXT_COLOR: &str = "#333333";

static FONT_DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

/// System fonts, loaded once per process.
fn font_db() -> Arc<usvg::fontdb::Database> {
    FONT_DB
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "Loaded system fonts for figure text");
            Arc::new(db)
        })
        .clone()
}

/// Escape text for inclusion in SVG markup.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(&self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// Incrementally built SVG document.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    width: u32,
    height: u32,
    body: String,
    /// Number of `<circle>` markers drawn, used by chart tests.
    markers: usize,
}

impl SvgCanvas {
    /// New canvas with a white background.
    pub fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self {
            width,
            height,
            body: String::new(),
            markers: 0,
        };
        let white = Color::rgb(255, 255, 255);
        canvas.rect(0.0, 0.0, width as f64, height as f64, white, None);
        canvas
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn marker_count(&self) -> usize {
        self.markers
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Color, stroke: Option<Color>) {
        let _ = write!(
            self.body,
            concat!(
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}""#,
                r#" fill="{}" fill-opacity="{:.3}""#
            ),
            x,
            y,
            w.max(0.0),
            h.max(0.0),
            fill.hex(),
            fill.opacity()
        );
        if let Some(s) = stroke {
            let _ = write!(self.body, r#" stroke="{}" stroke-width="1""#, s.hex());
        }
        self.body.push_str("/>");
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: Color, width: f64) {
        let _ = write!(
            self.body,
            concat!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}""#,
                r#" stroke="{}" stroke-width="{:.2}"/>"#
            ),
            x1,
            y1,
            x2,
            y2,
            stroke.hex(),
            width
        );
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: Color, width: f64) {
        if points.len() < 2 {
            return;
        }
        let coords: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{:.2},{:.2}", x, y))
            .collect();
        let _ = write!(
            self.body,
            concat!(
                r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{:.2}""#,
                r#" stroke-linejoin="round"/>"#
            ),
            coords.join(" "),
            stroke.hex(),
            width
        );
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: Color) {
        self.markers += 1;
        let _ = write!(
            self.body,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
            cx,
            cy,
            r,
            fill.hex()
        );
    }

    /// Filled path from raw path data.
    pub fn path(&mut self, d: &str, fill: Color, stroke: Option<Color>) {
        let _ = write!(
            self.body,
            r#"<path d="{}" fill="{}" fill-opacity="{:.3}""#,
            d,
            fill.hex(),
            fill.opacity()
        );
        if let Some(s) = stroke {
            let _ = write!(self.body, r#" stroke="{}" stroke-width="1""#, s.hex());
        }
        self.body.push_str("/>");
    }

    pub fn text(&mut self, x: f64, y: f64, size: f64, anchor: Anchor, content: &str) {
        let _ = write!(
            self.body,
            concat!(
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}""#,
                r#" text-anchor="{}" fill="{}">{}</text>"#
            ),
            x,
            y,
            FONT_FAMILY,
            size,
            anchor.as_str(),
            TEXT_COLOR,
            escape_xml(content)
        );
    }

    /// Text rotated -90 degrees about its anchor (y-axis labels).
    pub fn vertical_text(&mut self, x: f64, y: f64, size: f64, content: &str) {
        let _ = write!(
            self.body,
            concat!(
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}""#,
                r#" text-anchor="middle" fill="{}" transform="rotate(-90 {:.2} {:.2})">"#,
                "{}</text>"
            ),
            x,
            y,
            FONT_FAMILY,
            size,
            TEXT_COLOR,
            x,
            y,
            escape_xml(content)
        );
    }

    /// Embed a PNG, scaled to the box without smoothing.
    pub fn png_image(&mut self, x: f64, y: f64, w: f64, h: f64, png: &[u8]) {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png);
        let _ = write!(
            self.body,
            concat!(
                r#"<image x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}""#,
                r#" preserveAspectRatio="none" image-rendering="optimizeSpeed""#,
                r#" xlink:href="data:image/png;base64,{}"/>"#
            ),
            x,
            y,
            w,
            h,
            encoded
        );
    }

    /// The finished SVG document.
    pub fn to_svg(&self) -> String {
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg""#,
                r#" xmlns:xlink="http://www.w3.org/1999/xlink""#,
                r#" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#
            ),
            w = self.width,
            h = self.height,
            body = self.body
        )
    }

    /// Rasterise and encode as PNG with `title` in a `tEXt` chunk.
    pub fn render(&self, title: &str) -> Result<RenderedImage, RenderError> {
        let (pixels, width, height) = rasterize(&self.to_svg())?;
        let png = encode_rgba(
            &pixels,
            width as usize,
            height as usize,
            &[(TITLE_KEYWORD, title)],
        )?;
        Ok(RenderedImage {
            png,
            width,
            height,
        })
    }
}

/// Rasterise an SVG document into straight-alpha RGBA pixels.
pub fn rasterize(svg: &str) -> Result<(Vec<u8>, u32, u32), RenderError> {
    let mut options = usvg::Options::default();
    options.fontdb = font_db();

    let tree = usvg::Tree::from_str(svg, &options)?;
    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or(RenderError::Canvas { width, height })?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha; PNG wants straight alpha.
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for p in pixmap.pixels() {
        let c = p.demultiply();
        pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok((pixels, width, height))
}
