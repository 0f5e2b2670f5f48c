//! Colour scales and category-mask rasterisation.

use rayon::prelude::*;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// `#rrggbb` for SVG fills (alpha is written separately as opacity).
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(&self) -> f32 {
        self.a as f32 / 255.0
    }
}

/// Linear blend between two colours, `t` clamped to [0, 1].
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| ((a as f32 * t_inv) + (b as f32 * t)).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

/// A fixed sequential colour scale defined by evenly spaced stops.
#[derive(Debug, Clone)]
pub struct SequentialScale {
    stops: Vec<Color>,
}

impl SequentialScale {
    pub fn new(stops: Vec<Color>) -> Self {
        Self { stops }
    }

    /// Viridis, sampled at nine stops.
    pub fn viridis() -> Self {
        Self::new(vec![
            Color::rgb(68, 1, 84),
            Color::rgb(71, 44, 122),
            Color::rgb(59, 81, 139),
            Color::rgb(44, 113, 142),
            Color::rgb(33, 144, 141),
            Color::rgb(39, 173, 129),
            Color::rgb(92, 200, 99),
            Color::rgb(170, 220, 50),
            Color::rgb(253, 231, 37),
        ])
    }

    /// Colour at normalised position `t` in [0, 1].
    pub fn at(&self, t: f32) -> Color {
        match self.stops.len() {
            0 => Color::transparent(),
            1 => self.stops[0],
            n => {
                let pos = t.clamp(0.0, 1.0) * (n - 1) as f32;
                let i = (pos.floor() as usize).min(n - 2);
                interpolate_color(self.stops[i], self.stops[i + 1], pos - i as f32)
            }
        }
    }
}

/// Colours used when painting a boolean category mask.
#[derive(Debug, Clone, Copy)]
pub struct MaskStyle {
    /// Cells holding the category
    pub present: Color,
    /// Valid cells of any other category
    pub absent: Color,
    /// No-data cells
    pub no_data: Color,
}

impl MaskStyle {
    /// Both ends of the sequential scale, grey for no-data.
    pub fn choropleth(scale: &SequentialScale) -> Self {
        Self {
            present: scale.at(1.0),
            absent: scale.at(0.0),
            no_data: Color::rgb(220, 220, 220),
        }
    }

    /// Category cells only, everything else transparent.
    pub fn overlay(scale: &SequentialScale) -> Self {
        Self {
            present: scale.at(1.0).with_alpha(200),
            absent: Color::transparent(),
            no_data: Color::transparent(),
        }
    }
}

/// Colours for a two-year change comparison.
#[derive(Debug, Clone, Copy)]
pub struct ChangeStyle {
    pub gained: Color,
    pub lost: Color,
    pub stable: Color,
    pub neither: Color,
    pub no_data: Color,
}

impl Default for ChangeStyle {
    fn default() -> Self {
        Self {
            gained: Color::rgb(26, 152, 80),
            lost: Color::rgb(215, 48, 39),
            stable: Color::rgb(69, 117, 180),
            neither: Color::rgb(245, 245, 245),
            no_data: Color::rgb(200, 200, 200),
        }
    }
}

/// Qualitative palette for chart series.
pub const SERIES_COLORS: [Color; 8] = [
    Color::rgb(31, 119, 180),
    Color::rgb(255, 127, 14),
    Color::rgb(44, 160, 44),
    Color::rgb(214, 39, 40),
    Color::rgb(148, 103, 189),
    Color::rgb(140, 86, 75),
    Color::rgb(227, 119, 194),
    Color::rgb(127, 127, 127),
];

pub fn series_color(index: usize) -> Color {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// Paint a category mask as RGBA pixels.
///
/// `no_data` is the code treated as missing.
pub fn render_mask(
    codes: &[u8],
    width: usize,
    code: u8,
    no_data: u8,
    style: &MaskStyle,
) -> Vec<u8> {
    let mut pixels = vec![0u8; codes.len() * 4];
    pixels
        .par_chunks_mut(width.max(1) * 4)
        .zip(codes.par_chunks(width.max(1)))
        .for_each(|(out, row)| {
            for (px, &c) in out.chunks_exact_mut(4).zip(row) {
                let color = if c == no_data {
                    style.no_data
                } else if c == code {
                    style.present
                } else {
                    style.absent
                };
                px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
            }
        });
    pixels
}

/// Paint gained/lost/stable cells between two equally shaped grids.
pub fn render_change(
    first: &[u8],
    second: &[u8],
    code: u8,
    no_data: u8,
    style: &ChangeStyle,
) -> Vec<u8> {
    first
        .par_iter()
        .zip(second.par_iter())
        .flat_map_iter(|(&a, &b)| {
            let color = if a == no_data || b == no_data {
                style.no_data
            } else {
                match (a == code, b == code) {
                    (false, true) => style.gained,
                    (true, false) => style.lost,
                    (true, true) => style.stable,
                    (false, false) => style.neither,
                }
            };
            [color.r, color.g, color.b, color.a]
        })
        .collect()
}
