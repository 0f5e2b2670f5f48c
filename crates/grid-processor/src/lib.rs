//! Categorical grid processing.
//!
//! Land-cover grids hold class codes, not measurements, so every operation
//! here copies whole cells and never blends neighbours:
//!
//! - **Reprojection** to WGS84 by nearest-neighbour lookup
//! - **Downsampling** by an integer stride before image rendering
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{CategoricalGrid, GridProcessorConfig};
//!
//! let config = GridProcessorConfig::from_env()?;
//! let display = grid.reproject_to_wgs84(config.resampling)?;
//! let preview = display.downsampled(1024);
//! ```

pub mod config;
pub mod downsample;
pub mod error;
pub mod reproject;
pub mod types;

pub use config::{GridProcessorConfig, ResamplingMethod};
pub use downsample::{downsample_stride, stride_for};
pub use error::{GridProcessorError, Result};
pub use reproject::reproject_to_wgs84;
pub use types::CategoricalGrid;
