//! Cartoon stylization
//!
//! Flattens colors with k-means, smooths them, and masks the result with
//! bold dark outlines taken from an adaptive threshold of the luminance.

use image::{Rgb, RgbImage};
use imageproc::filter::median_filter;

use crate::imaging::filter::{adaptive_threshold_mean, bilateral_filter};
use crate::imaging::{kmeans_quantize, to_gray, KMeansCriteria};

/// Fixed so the same frame always cartoonizes the same way
pub const DEFAULT_SEED: u64 = 0x00C0_FFEE;

#[derive(Debug, Clone, Copy)]
pub struct CartoonParams {
    pub clusters: usize,
    pub seed: u64,
    pub criteria: KMeansCriteria,
    pub bilateral_diameter: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
    /// Median radius applied to the luminance before thresholding
    pub median_radius: u32,
    pub block_size: u32,
    pub threshold_offset: i32,
}

impl Default for CartoonParams {
    fn default() -> Self {
        Self {
            clusters: 8,
            seed: DEFAULT_SEED,
            criteria: KMeansCriteria::default(),
            bilateral_diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
            median_radius: 3,
            block_size: 9,
            threshold_offset: 2,
        }
    }
}

pub fn render(image: &RgbImage, params: &CartoonParams) -> RgbImage {
    let quantized = kmeans_quantize(image, params.clusters, params.seed, params.criteria);
    let colors = bilateral_filter(
        &quantized,
        params.bilateral_diameter,
        params.sigma_color,
        params.sigma_space,
    );

    let gray = median_filter(&to_gray(image), params.median_radius, params.median_radius);
    let edges = adaptive_threshold_mean(&gray, params.block_size, params.threshold_offset);

    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let e = edges.get_pixel(x, y).0[0];
        let c = colors.get_pixel(x, y).0;
        Rgb([c[0] & e, c[1] & e, c[2] & e])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> RgbImage {
        RgbImage::from_fn(24, 24, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 128]))
    }

    #[test]
    fn test_flat_frame_is_unchanged() {
        let image = RgbImage::from_pixel(16, 16, Rgb([120, 60, 30]));
        assert_eq!(render(&image, &CartoonParams::default()), image);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let params = CartoonParams::default();
        assert_eq!(render(&gradient(), &params), render(&gradient(), &params));
    }

    #[test]
    fn test_dark_line_becomes_outline() {
        let mut image = RgbImage::from_pixel(20, 20, Rgb([200, 200, 200]));
        for y in 0..20 {
            image.put_pixel(10, y, Rgb([10, 10, 10]));
            image.put_pixel(11, y, Rgb([10, 10, 10]));
        }
        let out = render(&image, &CartoonParams {
            median_radius: 0,
            ..CartoonParams::default()
        });
        assert_eq!(out.get_pixel(10, 10).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(2, 10).0, [200, 200, 200]);
    }
}
