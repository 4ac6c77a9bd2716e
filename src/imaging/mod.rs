//! Imaging primitives
//!
//! Pixel-level building blocks used by the effect renderers: color
//! conversion, smoothing filters, color quantization, overlay drawing and
//! the standalone enhancement utilities.

pub mod color;
pub mod draw;
pub mod enhance;
pub mod filter;
pub mod quantize;

pub use color::{convert_color_space, to_gray, ColorSpace};
pub use enhance::{
    adjust_brightness_contrast, apply_color_filter, detect_motion, sharpen, ColorFilter,
    MotionReport,
};
pub use filter::{adaptive_threshold_mean, add_weighted, bilateral_filter, gaussian_blur};
pub use quantize::{kmeans_quantize, KMeansCriteria};
