//! Whole-frame enhancement utilities
//!
//! These sit outside the effect modes: the CLI applies them as a final
//! `--filter` pass, and motion detection compares consecutive frames.

use std::fmt;
use std::str::FromStr;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::color::{clamp_u8, hsv_to_rgb, rgb_to_hsv, to_gray};
use crate::error::{EffectsError, Result};

/// Fraction of changed pixels (in percent) above which motion is reported
const MOTION_PERCENT_THRESHOLD: f32 = 1.0;

/// Color grading presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFilter {
    Warm,
    Cool,
    Vintage,
    Vivid,
}

impl ColorFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorFilter::Warm => "warm",
            ColorFilter::Cool => "cool",
            ColorFilter::Vintage => "vintage",
            ColorFilter::Vivid => "vivid",
        }
    }
}

impl fmt::Display for ColorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorFilter {
    type Err = EffectsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "warm" => Ok(ColorFilter::Warm),
            "cool" => Ok(ColorFilter::Cool),
            "vintage" => Ok(ColorFilter::Vintage),
            "vivid" => Ok(ColorFilter::Vivid),
            other => Err(EffectsError::invalid(format!("unknown color filter '{}'", other))),
        }
    }
}

/// Result of comparing two frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionReport {
    pub detected: bool,
    /// Share of pixels whose gray level changed by more than the threshold
    pub percentage: f32,
}

/// Shift brightness and stretch contrast.
///
/// Both adjustments take values in `[-100, 100]`; zero leaves the image as is.
pub fn adjust_brightness_contrast(image: &RgbImage, brightness: f32, contrast: f32) -> Result<RgbImage> {
    if !(-100.0..=100.0).contains(&brightness) || !(-100.0..=100.0).contains(&contrast) {
        return Err(EffectsError::invalid(format!(
            "brightness/contrast must be within [-100, 100], got {}/{}",
            brightness, contrast
        )));
    }

    let mut out = image.clone();
    if brightness != 0.0 {
        let (shadow, highlight) = if brightness > 0.0 {
            (brightness, 255.0)
        } else {
            (0.0, 255.0 + brightness)
        };
        let alpha = (highlight - shadow) / 255.0;
        map_channels(&mut out, |v| v * alpha + shadow);
    }
    if contrast != 0.0 {
        let f = 131.0 * (contrast + 127.0) / (127.0 * (131.0 - contrast));
        let gamma = 127.0 * (1.0 - f);
        map_channels(&mut out, |v| v * f + gamma);
    }
    Ok(out)
}

pub fn apply_color_filter(image: &RgbImage, filter: ColorFilter) -> RgbImage {
    let mut out = image.clone();
    match filter {
        ColorFilter::Warm => {
            for p in out.pixels_mut() {
                p.0[0] = clamp_u8(p.0[0] as f32 * 1.1);
                p.0[1] = clamp_u8(p.0[1] as f32 * 1.05);
            }
        }
        ColorFilter::Cool => {
            for p in out.pixels_mut() {
                p.0[2] = clamp_u8(p.0[2] as f32 * 1.1);
                p.0[0] = clamp_u8(p.0[0] as f32 * 0.95);
            }
        }
        ColorFilter::Vintage => {
            for p in out.pixels_mut() {
                let [r, g, b] = p.0.map(|c| c as f32);
                p.0 = [
                    clamp_u8(0.393 * r + 0.769 * g + 0.189 * b),
                    clamp_u8(0.349 * r + 0.686 * g + 0.168 * b),
                    clamp_u8(0.272 * r + 0.534 * g + 0.131 * b),
                ];
            }
        }
        ColorFilter::Vivid => {
            for p in out.pixels_mut() {
                let [h, s, v] = rgb_to_hsv(p.0);
                p.0 = hsv_to_rgb([h, clamp_u8(s as f32 * 1.3), v]);
            }
        }
    }
    out
}

/// 3×3 sharpening kernel (center 9, neighbours -1) scaled by `strength`.
pub fn sharpen(image: &RgbImage, strength: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;

    RgbImage::from_fn(width, height, |x, y| {
        let mut acc = [0.0f32; 3];
        for dy in -1..=1 {
            for dx in -1..=1 {
                let sx = (x as i32 + dx).clamp(0, max_x) as u32;
                let sy = (y as i32 + dy).clamp(0, max_y) as u32;
                let weight = if dx == 0 && dy == 0 { 9.0 } else { -1.0 } * strength;
                let p = image.get_pixel(sx, sy).0;
                for ch in 0..3 {
                    acc[ch] += p[ch] as f32 * weight;
                }
            }
        }
        Rgb(acc.map(clamp_u8))
    })
}

/// Compare two frames by absolute gray-level difference.
pub fn detect_motion(previous: &RgbImage, current: &RgbImage, threshold: u8) -> Result<MotionReport> {
    if previous.dimensions() != current.dimensions() {
        return Err(EffectsError::invalid(format!(
            "frame sizes differ: {:?} vs {:?}",
            previous.dimensions(),
            current.dimensions()
        )));
    }

    let prev_gray = to_gray(previous);
    let curr_gray = to_gray(current);
    let total = prev_gray.as_raw().len();
    if total == 0 {
        return Ok(MotionReport {
            detected: false,
            percentage: 0.0,
        });
    }

    let changed = prev_gray
        .as_raw()
        .iter()
        .zip(curr_gray.as_raw())
        .filter(|(a, b)| a.abs_diff(**b) > threshold)
        .count();
    let percentage = changed as f32 / total as f32 * 100.0;

    Ok(MotionReport {
        detected: percentage > MOTION_PERCENT_THRESHOLD,
        percentage,
    })
}

fn map_channels(image: &mut RgbImage, f: impl Fn(f32) -> f32) {
    for p in image.pixels_mut() {
        p.0 = p.0.map(|c| clamp_u8(f(c as f32)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_adjustment_is_identity() {
        let image = RgbImage::from_pixel(4, 4, Rgb([12, 130, 250]));
        let out = adjust_brightness_contrast(&image, 0.0, 0.0).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn test_brightness_lifts_shadows() {
        let image = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let out = adjust_brightness_contrast(&image, 40.0, 0.0).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [40, 40, 40]);
    }

    #[test]
    fn test_out_of_range_adjustment_rejected() {
        let image = RgbImage::new(2, 2);
        assert!(adjust_brightness_contrast(&image, 0.0, 131.0).is_err());
    }

    #[test]
    fn test_warm_boosts_red() {
        let image = RgbImage::from_pixel(1, 1, Rgb([100, 100, 100]));
        let out = apply_color_filter(&image, ColorFilter::Warm);
        assert_eq!(out.get_pixel(0, 0).0, [110, 105, 100]);
    }

    #[test]
    fn test_vivid_leaves_gray_alone() {
        let image = RgbImage::from_pixel(1, 1, Rgb([90, 90, 90]));
        let out = apply_color_filter(&image, ColorFilter::Vivid);
        assert_eq!(out.get_pixel(0, 0).0, [90, 90, 90]);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("Vintage".parse::<ColorFilter>().unwrap(), ColorFilter::Vintage);
        assert!("sepia".parse::<ColorFilter>().is_err());
    }

    #[test]
    fn test_sharpen_keeps_flat_image() {
        let image = RgbImage::from_pixel(5, 5, Rgb([70, 80, 90]));
        assert_eq!(sharpen(&image, 1.0), image);
    }

    #[test]
    fn test_detect_motion() {
        let previous = RgbImage::new(10, 10);
        let mut current = previous.clone();
        for x in 0..10 {
            current.put_pixel(x, 0, Rgb([255, 255, 255]));
        }
        let report = detect_motion(&previous, &current, 25).unwrap();
        assert!(report.detected);
        assert_relative_eq!(report.percentage, 10.0, epsilon = 1e-4);

        let still = detect_motion(&previous, &previous, 25).unwrap();
        assert!(!still.detected);
    }
}
