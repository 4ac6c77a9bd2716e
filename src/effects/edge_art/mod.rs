//! Edge art
//!
//! Canny edges drawn in yellow over a slightly darkened frame.

use image::{Rgb, RgbImage};
use imageproc::edges::canny;

use crate::imaging::filter::{add_weighted, gaussian_blur_gray};
use crate::imaging::to_gray;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParams {
    /// Pre-blur kernel size
    pub blur_kernel: u32,
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Weight of the original frame in the blend; the overlay gets the rest
    pub frame_weight: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            low_threshold: 50.0,
            high_threshold: 150.0,
            frame_weight: 0.7,
        }
    }
}

pub fn render(image: &RgbImage, params: &EdgeParams) -> RgbImage {
    let gray = gaussian_blur_gray(&to_gray(image), params.blur_kernel);
    let edges = canny(&gray, params.low_threshold, params.high_threshold);

    // Edge strength in red and green renders yellow
    let overlay = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let e = edges.get_pixel(x, y).0[0];
        Rgb([e, e, 0])
    });

    add_weighted(image, params.frame_weight, &overlay, 1.0 - params.frame_weight, 0.0)
}
