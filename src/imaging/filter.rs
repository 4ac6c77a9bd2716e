//! Smoothing, thresholding and blending primitives

use image::{GrayImage, Luma, RgbImage};

use super::color::clamp_u8;

/// Gaussian sigma implied by an odd kernel size when no sigma is given
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    let k = kernel_size.max(1) as f32;
    0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
}

/// Gaussian blur sized by kernel; even kernels are bumped to the next odd size.
pub fn gaussian_blur(image: &RgbImage, kernel_size: u32) -> RgbImage {
    let kernel_size = kernel_size | 1;
    image::imageops::blur(image, sigma_for_kernel(kernel_size))
}

/// Single-channel variant of [`gaussian_blur`]
pub fn gaussian_blur_gray(image: &GrayImage, kernel_size: u32) -> GrayImage {
    let kernel_size = kernel_size | 1;
    image::imageops::blur(image, sigma_for_kernel(kernel_size))
}

/// Edge-preserving bilateral filter.
///
/// `diameter` is the neighbourhood size; only offsets inside the inscribed
/// circle contribute. Color distance is the L1 distance over the three
/// channels. Borders replicate the edge pixels.
pub fn bilateral_filter(
    image: &RgbImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let sigma_color = if sigma_color <= 0.0 { 1.0 } else { sigma_color };
    let sigma_space = if sigma_space <= 0.0 { 1.0 } else { sigma_space };
    let radius = (diameter / 2).max(1) as i32;

    let mut offsets: Vec<(i32, i32, f32)> = Vec::new();
    let space_coeff = -0.5 / (sigma_space * sigma_space);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f32;
            if r2 > (radius * radius) as f32 {
                continue;
            }
            offsets.push((dx, dy, (r2 * space_coeff).exp()));
        }
    }

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let color_weights: Vec<f32> = (0..=255 * 3)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let src = image.as_raw();
    let stride = width as usize * 3;
    let mut out = vec![0u8; src.len()];

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let center = y as usize * stride + x as usize * 3;
            let c = &src[center..center + 3];

            let mut sum = [0.0f32; 3];
            let mut weight_sum = 0.0f32;
            for &(dx, dy, space_weight) in &offsets {
                let sx = (x + dx).clamp(0, width as i32 - 1) as usize;
                let sy = (y + dy).clamp(0, height as i32 - 1) as usize;
                let idx = sy * stride + sx * 3;
                let n = &src[idx..idx + 3];

                let distance = (c[0] as i32 - n[0] as i32).unsigned_abs()
                    + (c[1] as i32 - n[1] as i32).unsigned_abs()
                    + (c[2] as i32 - n[2] as i32).unsigned_abs();
                let w = space_weight * color_weights[distance as usize];

                sum[0] += n[0] as f32 * w;
                sum[1] += n[1] as f32 * w;
                sum[2] += n[2] as f32 * w;
                weight_sum += w;
            }

            for ch in 0..3 {
                out[center + ch] = clamp_u8(sum[ch] / weight_sum);
            }
        }
    }

    RgbImage::from_raw(width, height, out).unwrap_or_else(|| image.clone())
}

/// Mean adaptive threshold.
///
/// A pixel becomes 255 when it is brighter than the mean of its
/// `block_size × block_size` neighbourhood minus `c`, otherwise 0.
pub fn adaptive_threshold_mean(image: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let radius = (block_size / 2) as i32;
    let area = ((2 * radius + 1) * (2 * radius + 1)) as u32;

    // Separable box sum with replicated borders
    let mut horizontal = vec![0u32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width as i32 {
            let mut sum = 0u32;
            for dx in -radius..=radius {
                let sx = (x + dx).clamp(0, width as i32 - 1) as u32;
                sum += image.get_pixel(sx, y).0[0] as u32;
            }
            horizontal[(y * width + x as u32) as usize] = sum;
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let mut sum = 0u32;
        for dy in -radius..=radius {
            let sy = (y as i32 + dy).clamp(0, height as i32 - 1) as u32;
            sum += horizontal[(sy * width + x) as usize];
        }
        let mean = ((sum as f32) / area as f32).round() as i32;
        let value = image.get_pixel(x, y).0[0] as i32;
        Luma([if value > mean - c { 255 } else { 0 }])
    })
}

/// Weighted sum `a * alpha + b * beta + gamma`, saturated to u8.
///
/// Images must share dimensions; `b` is sampled with clamping otherwise.
pub fn add_weighted(a: &RgbImage, alpha: f32, b: &RgbImage, beta: f32, gamma: f32) -> RgbImage {
    let (bw, bh) = b.dimensions();
    RgbImage::from_fn(a.width(), a.height(), |x, y| {
        let pa = a.get_pixel(x, y).0;
        let pb = b.get_pixel(x.min(bw.saturating_sub(1)), y.min(bh.saturating_sub(1))).0;
        image::Rgb([
            clamp_u8(pa[0] as f32 * alpha + pb[0] as f32 * beta + gamma),
            clamp_u8(pa[1] as f32 * alpha + pb[1] as f32 * beta + gamma),
            clamp_u8(pa[2] as f32 * alpha + pb[2] as f32 * beta + gamma),
        ])
    })
}

/// Scale and offset each channel, taking the absolute value before saturating.
pub fn convert_scale_abs(value: u8, alpha: f32, beta: f32) -> u8 {
    clamp_u8((value as f32 * alpha + beta).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_sigma_for_kernel() {
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-5);
        assert!((sigma_for_kernel(55) - 8.6).abs() < 1e-4);
    }

    #[test]
    fn test_bilateral_keeps_flat_image() {
        let image = RgbImage::from_pixel(8, 8, Rgb([90, 120, 200]));
        let filtered = bilateral_filter(&image, 9, 75.0, 75.0);
        assert_eq!(filtered, image);
    }

    #[test]
    fn test_bilateral_preserves_strong_edge() {
        let image = RgbImage::from_fn(10, 4, |x, _| {
            if x < 5 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let filtered = bilateral_filter(&image, 5, 10.0, 10.0);
        assert!(filtered.get_pixel(4, 1).0[0] < 5);
        assert!(filtered.get_pixel(5, 1).0[0] > 250);
    }

    #[test]
    fn test_adaptive_threshold_flat_is_white() {
        let image = GrayImage::from_pixel(6, 6, Luma([100]));
        let out = adaptive_threshold_mean(&image, 9, 2);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_adaptive_threshold_marks_dark_line() {
        let image = GrayImage::from_fn(9, 9, |x, _| if x == 4 { Luma([0]) } else { Luma([200]) });
        let out = adaptive_threshold_mean(&image, 9, 2);
        assert_eq!(out.get_pixel(4, 4).0[0], 0);
        assert_eq!(out.get_pixel(0, 4).0[0], 255);
    }

    #[test]
    fn test_add_weighted() {
        let a = RgbImage::from_pixel(2, 2, Rgb([100, 200, 0]));
        let b = RgbImage::from_pixel(2, 2, Rgb([0, 100, 250]));
        let out = add_weighted(&a, 0.7, &b, 0.3, 0.0);
        assert_eq!(out.get_pixel(0, 0).0, [70, 170, 75]);
    }

    #[test]
    fn test_convert_scale_abs_saturates() {
        assert_eq!(convert_scale_abs(250, 1.05, 5.0), 255);
        assert_eq!(convert_scale_abs(100, 1.05, 5.0), 110);
    }
}
