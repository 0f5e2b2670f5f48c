//! Image rendering for land-cover statistics and category maps.
//!
//! Implements:
//! - Line, bar and pie charts of per-year areas
//! - Choropleth, side-by-side and change maps of category masks
//! - Transparent category overlays for web basemaps
//!
//! Figures are composed as SVG and rasterised with resvg; PNG encoding is
//! done in-house and every artifact carries its title in a `tEXt` chunk.

pub mod chart;
pub mod colormap;
pub mod error;
pub mod map;
pub mod png;
pub mod svg;

pub use chart::{BarChart, LineChart, PieChart, Series};
pub use colormap::{Color, SequentialScale};
pub use error::RenderError;
pub use map::{render_change_map, render_choropleth, render_overlay, render_side_by_side, GridView};
pub use png::{encode_rgba, read_text_chunk, TITLE_KEYWORD};

use base64::Engine;

/// An encoded PNG artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedImage {
    pub const MEDIA_TYPE: &'static str = "image/png";

    /// Standard base64 of the PNG bytes, as returned to clients.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }

    /// Title stored in the PNG, if any.
    pub fn title(&self) -> Option<String> {
        read_text_chunk(&self.png, TITLE_KEYWORD)
    }
}
