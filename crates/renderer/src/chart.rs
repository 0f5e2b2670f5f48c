//! Line, bar and pie charts for per-year category statistics.

use crate::colormap::{series_color, Color};
use crate::error::RenderError;
use crate::svg::{Anchor, SvgCanvas};
use crate::RenderedImage;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 170.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;
const Y_TICKS: usize = 5;

const AXIS: Color = Color::rgb(80, 80, 80);
const GRID: Color = Color::rgb(225, 225, 225);

/// A named sequence of labelled values.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(String, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn point(mut self, label: impl Into<String>, value: f64) -> Self {
        self.points.push((label.into(), value));
        self
    }
}

/// Round up to 1, 2, 2.5 or 5 times a power of ten.
pub fn nice_ceiling(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 1.0;
    }
    let exp = value.log10().floor();
    let base = 10f64.powf(exp);
    for step in [1.0, 2.0, 2.5, 5.0, 10.0] {
        if value <= step * base + f64::EPSILON * value {
            return step * base;
        }
    }
    10.0 * base
}

/// Tick label with thousands separators and at most two decimals.
pub fn format_value(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let whole = rounded.trunc() as i64;
    let mut digits = whole.abs().to_string();
    let mut grouped = String::new();
    while digits.len() > 3 {
        let tail = digits.split_off(digits.len() - 3);
        grouped = format!(",{}{}", tail, grouped);
    }
    grouped = format!("{}{}{}", if rounded < 0.0 { "-" } else { "" }, digits, grouped);
    let frac = (rounded.fract().abs() * 100.0).round() as u32;
    if frac == 0 {
        grouped
    } else if frac % 10 == 0 {
        format!("{}.{}", grouped, frac / 10)
    } else {
        format!("{}.{:02}", grouped, frac)
    }
}

/// Plot area in canvas coordinates.
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    y_max: f64,
}

impl PlotArea {
    fn new(y_max: f64) -> Self {
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: WIDTH as f64 - MARGIN_LEFT - MARGIN_RIGHT,
            height: HEIGHT as f64 - MARGIN_TOP - MARGIN_BOTTOM,
            y_max: nice_ceiling(y_max),
        }
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn y(&self, value: f64) -> f64 {
        self.bottom() - (value / self.y_max).clamp(0.0, 1.0) * self.height
    }

    /// Frame, horizontal grid lines, y tick labels and axis titles.
    fn draw_axes(&self, canvas: &mut SvgCanvas, title: &str, x_label: &str, y_label: &str) {
        canvas.text(WIDTH as f64 / 2.0, 32.0, 18.0, Anchor::Middle, title);
        for i in 0..=Y_TICKS {
            let value = self.y_max * i as f64 / Y_TICKS as f64;
            let y = self.y(value);
            canvas.line(self.left, y, self.left + self.width, y, GRID, 1.0);
            canvas.text(self.left - 8.0, y + 4.0, 11.0, Anchor::End, &format_value(value));
        }
        canvas.line(self.left, self.top, self.left, self.bottom(), AXIS, 1.5);
        canvas.line(self.left, self.bottom(), self.left + self.width, self.bottom(), AXIS, 1.5);
        canvas.text(
            self.left + self.width / 2.0,
            HEIGHT as f64 - 20.0,
            13.0,
            Anchor::Middle,
            x_label,
        );
        canvas.vertical_text(20.0, self.top + self.height / 2.0, 13.0, y_label);
    }
}

/// Legend entries down the right-hand margin.
fn draw_legend(canvas: &mut SvgCanvas, entries: &[(Color, String)]) {
    let x = WIDTH as f64 - MARGIN_RIGHT + 20.0;
    for (i, (color, label)) in entries.iter().enumerate() {
        let y = MARGIN_TOP + 10.0 + i as f64 * 22.0;
        canvas.rect(x, y - 10.0, 14.0, 14.0, *color, None);
        canvas.text(x + 20.0, y + 2.0, 12.0, Anchor::Start, label);
    }
}

/// Distinct point labels across all series, in first-seen order.
fn categories(series: &[Series]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for s in series {
        for (label, _) in &s.points {
            if !out.contains(label) {
                out.push(label.clone());
            }
        }
    }
    out
}

fn max_value(series: &[Series]) -> f64 {
    series
        .iter()
        .flat_map(|s| s.points.iter().map(|(_, v)| *v))
        .fold(0.0, f64::max)
}

/// Values over ordered categories (years), one line per series.
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl LineChart {
    /// Number of plotted points across all series.
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    pub fn canvas(&self) -> SvgCanvas {
        let mut canvas = SvgCanvas::new(WIDTH, HEIGHT);
        let area = PlotArea::new(max_value(&self.series));
        area.draw_axes(&mut canvas, &self.title, &self.x_label, &self.y_label);

        let labels = categories(&self.series);
        if labels.is_empty() {
            canvas.text(
                area.left + area.width / 2.0,
                area.top + area.height / 2.0,
                14.0,
                Anchor::Middle,
                "No data available",
            );
            return canvas;
        }

        let step = area.width / labels.len() as f64;
        let x_of = |label: &str| {
            let i = labels.iter().position(|l| l == label).unwrap_or(0);
            area.left + step * (i as f64 + 0.5)
        };
        for label in &labels {
            canvas.text(x_of(label), area.bottom() + 20.0, 12.0, Anchor::Middle, label);
        }

        let mut legend = Vec::with_capacity(self.series.len());
        for (i, s) in self.series.iter().enumerate() {
            let color = series_color(i);
            let points: Vec<(f64, f64)> = s
                .points
                .iter()
                .map(|(label, value)| (x_of(label), area.y(*value)))
                .collect();
            canvas.polyline(&points, color, 2.5);
            for &(x, y) in &points {
                canvas.circle(x, y, 5.0, color);
            }
            legend.push((color, s.name.clone()));
        }
        draw_legend(&mut canvas, &legend);
        canvas
    }

    pub fn render(&self) -> Result<RenderedImage, RenderError> {
        self.canvas().render(&self.title)
    }
}

/// Grouped bars: one group per category, one bar per series.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl BarChart {
    pub fn bar_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    pub fn canvas(&self) -> SvgCanvas {
        let mut canvas = SvgCanvas::new(WIDTH, HEIGHT);
        let area = PlotArea::new(max_value(&self.series));
        area.draw_axes(&mut canvas, &self.title, &self.x_label, &self.y_label);

        let groups = categories(&self.series);
        if groups.is_empty() || self.series.is_empty() {
            canvas.text(
                area.left + area.width / 2.0,
                area.top + area.height / 2.0,
                14.0,
                Anchor::Middle,
                "No data available",
            );
            return canvas;
        }

        let group_width = area.width / groups.len() as f64;
        let bar_width = group_width * 0.8 / self.series.len() as f64;
        for (g, group) in groups.iter().enumerate() {
            let group_left = area.left + g as f64 * group_width + group_width * 0.1;
            canvas.text(
                group_left + group_width * 0.4,
                area.bottom() + 20.0,
                12.0,
                Anchor::Middle,
                group,
            );
            for (i, s) in self.series.iter().enumerate() {
                let Some((_, value)) = s.points.iter().find(|(l, _)| l == group) else {
                    continue;
                };
                let x = group_left + i as f64 * bar_width;
                let y = area.y(*value);
                canvas.rect(x, y, bar_width * 0.95, area.bottom() - y, series_color(i), None);
            }
        }

        let legend: Vec<(Color, String)> = self
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| (series_color(i), s.name.clone()))
            .collect();
        draw_legend(&mut canvas, &legend);
        canvas
    }

    pub fn render(&self) -> Result<RenderedImage, RenderError> {
        self.canvas().render(&self.title)
    }
}

/// Shares of a whole.
#[derive(Debug, Clone)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<(String, f64)>,
}

impl PieChart {
    pub fn canvas(&self) -> SvgCanvas {
        let mut canvas = SvgCanvas::new(WIDTH, HEIGHT);
        canvas.text(WIDTH as f64 / 2.0, 32.0, 18.0, Anchor::Middle, &self.title);

        let (cx, cy, r) = (
            (WIDTH as f64 - MARGIN_RIGHT) / 2.0,
            MARGIN_TOP + (HEIGHT as f64 - MARGIN_TOP - 30.0) / 2.0,
            170.0,
        );
        let total: f64 = self.slices.iter().map(|(_, v)| v.max(0.0)).sum();
        if total <= 0.0 {
            canvas.circle(cx, cy, r, Color::rgb(220, 220, 220));
            canvas.text(cx, cy, 14.0, Anchor::Middle, "No data available");
            return canvas;
        }

        let mut legend = Vec::new();
        let mut angle = -std::f64::consts::FRAC_PI_2;
        for (i, (label, value)) in self.slices.iter().enumerate() {
            let share = value.max(0.0) / total;
            let color = series_color(i);
            legend.push((color, format!("{} ({:.1}%)", label, share * 100.0)));
            if share <= 0.0 {
                continue;
            }
            if share >= 1.0 - 1e-9 {
                canvas.circle(cx, cy, r, color);
                continue;
            }
            let end = angle + share * std::f64::consts::TAU;
            let (x0, y0) = (cx + r * angle.cos(), cy + r * angle.sin());
            let (x1, y1) = (cx + r * end.cos(), cy + r * end.sin());
            let large = if share > 0.5 { 1 } else { 0 };
            let d = format!(
                "M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 1 {:.2} {:.2} Z",
                cx, cy, x0, y0, r, r, large, x1, y1
            );
            canvas.path(&d, color, Some(Color::rgb(255, 255, 255)));
            angle = end;
        }
        draw_legend(&mut canvas, &legend);
        canvas
    }

    pub fn render(&self) -> Result<RenderedImage, RenderError> {
        self.canvas().render(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nice_ceiling() {
        assert_eq!(nice_ceiling(0.0), 1.0);
        assert_eq!(nice_ceiling(7.0), 10.0);
        assert_eq!(nice_ceiling(180.0), 200.0);
        assert_eq!(nice_ceiling(2300.0), 2500.0);
        assert_eq!(nice_ceiling(4000.0), 5000.0);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(1234567.25), "1,234,567.25");
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(999.0), "999");
    }

    #[test]
    fn test_line_chart_single_point() {
        let chart = LineChart {
            title: "Grasslands area".into(),
            x_label: "Year".into(),
            y_label: "Area (km²)".into(),
            series: vec![Series::new("grasslands").point("2015", 12.5)],
        };
        assert_eq!(chart.point_count(), 1);
        assert_eq!(chart.canvas().marker_count(), 1);
    }

    #[test]
    fn test_empty_line_chart_draws_placeholder() {
        let chart = LineChart {
            title: "Empty".into(),
            x_label: "Year".into(),
            y_label: "Area".into(),
            series: vec![Series::new("croplands")],
        };
        let svg = chart.canvas().to_svg();
        assert!(svg.contains("No data available"));
        assert_eq!(chart.canvas().marker_count(), 0);
    }

    #[test]
    fn test_bar_chart_counts() {
        let chart = BarChart {
            title: "Comparison".into(),
            x_label: "Category".into(),
            y_label: "Area".into(),
            series: vec![
                Series::new("2012").point("croplands", 10.0).point("grasslands", 4.0),
                Series::new("2018").point("croplands", 12.0),
            ],
        };
        assert_eq!(chart.bar_count(), 3);
        assert!(chart.canvas().to_svg().contains("grasslands"));
    }

    #[test]
    fn test_pie_chart_legend_shares() {
        let chart = PieChart {
            title: "Share".into(),
            slices: vec![("croplands".into(), 25.0), ("Other".into(), 75.0)],
        };
        let svg = chart.canvas().to_svg();
        assert!(svg.contains("croplands (25.0%)"));
        assert!(svg.contains("Other (75.0%)"));
    }
}
