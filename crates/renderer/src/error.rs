//! Rendering errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid render input: {0}")]
    InvalidInput(String),

    #[error("SVG parse failed: {0}")]
    Svg(#[from] usvg::Error),

    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Png(String),

    #[error("grids differ in shape: {0}x{1} vs {2}x{3}")]
    ShapeMismatch(usize, usize, usize, usize),
}
