//! Color space conversion
//!
//! Conversions follow the 8-bit conventions used by common vision toolkits:
//! hue is stored in `[0, 180)`, LAB lightness is scaled to `[0, 255]` and the
//! chroma planes of LAB/YUV are offset by 128.

use std::fmt;
use std::str::FromStr;

use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{EffectsError, Result};

/// Interleaved 8-bit color layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorSpace {
    Bgr,
    Rgb,
    Gray,
    Hsv,
    Lab,
    Yuv,
}

impl ColorSpace {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            _ => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorSpace::Bgr => "BGR",
            ColorSpace::Rgb => "RGB",
            ColorSpace::Gray => "GRAY",
            ColorSpace::Hsv => "HSV",
            ColorSpace::Lab => "LAB",
            ColorSpace::Yuv => "YUV",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorSpace {
    type Err = EffectsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BGR" => Ok(ColorSpace::Bgr),
            "RGB" => Ok(ColorSpace::Rgb),
            "GRAY" => Ok(ColorSpace::Gray),
            "HSV" => Ok(ColorSpace::Hsv),
            "LAB" => Ok(ColorSpace::Lab),
            "YUV" => Ok(ColorSpace::Yuv),
            other => Err(EffectsError::invalid(format!("unknown color space '{}'", other))),
        }
    }
}

/// Convert an interleaved pixel buffer between color spaces.
///
/// Supported pairs: BGR↔RGB, BGR/RGB→GRAY, GRAY→BGR/RGB, and BGR↔HSV/LAB/YUV.
/// Anything else, including identity conversions, is rejected.
pub fn convert_color_space(data: &[u8], from: ColorSpace, to: ColorSpace) -> Result<Vec<u8>> {
    use ColorSpace::*;

    let per_pixel: fn(&[u8], &mut Vec<u8>) = match (from, to) {
        (Bgr, Rgb) | (Rgb, Bgr) => |p, out| out.extend_from_slice(&[p[2], p[1], p[0]]),
        (Bgr, Gray) => |p, out| out.push(luma(p[2], p[1], p[0])),
        (Rgb, Gray) => |p, out| out.push(luma(p[0], p[1], p[2])),
        (Gray, Bgr) | (Gray, Rgb) => |p, out| out.extend_from_slice(&[p[0], p[0], p[0]]),
        (Bgr, Hsv) => |p, out| out.extend_from_slice(&rgb_to_hsv([p[2], p[1], p[0]])),
        (Hsv, Bgr) => |p, out| {
            let [r, g, b] = hsv_to_rgb([p[0], p[1], p[2]]);
            out.extend_from_slice(&[b, g, r]);
        },
        (Bgr, Lab) => |p, out| out.extend_from_slice(&rgb_to_lab([p[2], p[1], p[0]])),
        (Lab, Bgr) => |p, out| {
            let [r, g, b] = lab_to_rgb([p[0], p[1], p[2]]);
            out.extend_from_slice(&[b, g, r]);
        },
        (Bgr, Yuv) => |p, out| out.extend_from_slice(&rgb_to_yuv([p[2], p[1], p[0]])),
        (Yuv, Bgr) => |p, out| {
            let [r, g, b] = yuv_to_rgb([p[0], p[1], p[2]]);
            out.extend_from_slice(&[b, g, r]);
        },
        _ => return Err(EffectsError::UnsupportedConversion { from, to }),
    };

    let step = from.channels();
    if data.len() % step != 0 {
        return Err(EffectsError::invalid(format!(
            "{} buffer length {} is not a multiple of {}",
            from,
            data.len(),
            step
        )));
    }

    let mut out = Vec::with_capacity(data.len() / step * to.channels());
    for pixel in data.chunks_exact(step) {
        per_pixel(pixel, &mut out);
    }
    Ok(out)
}

/// BT.601 grayscale of an RGB image
pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y).0;
        Luma([luma(p[0], p[1], p[2])])
    })
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    clamp_u8(0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
}

pub(crate) fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub(crate) fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let s = if max > 0.0 { diff / max * 255.0 } else { 0.0 };
    let mut h = if diff == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    // 180 wraps back to 0 in the half-degree encoding
    let h = clamp_u8(h / 2.0) % 180;
    [h, clamp_u8(s), clamp_u8(max)]
}

pub(crate) fn hsv_to_rgb([h, s, v]: [u8; 3]) -> [u8; 3] {
    let h = (h as f32 * 2.0) / 60.0;
    let s = s as f32 / 255.0;
    let v = v as f32;

    let sector = (h.floor() as i32).rem_euclid(6);
    let f = h - h.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}

fn rgb_to_yuv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = 0.492 * (b - y) + 128.0;
    let v = 0.877 * (r - y) + 128.0;
    [clamp_u8(y), clamp_u8(u), clamp_u8(v)]
}

fn yuv_to_rgb([y, u, v]: [u8; 3]) -> [u8; 3] {
    let (y, u, v) = (y as f32, u as f32 - 128.0, v as f32 - 128.0);
    [
        clamp_u8(y + 1.140 * v),
        clamp_u8(y - 0.395 * u - 0.581 * v),
        clamp_u8(y + 2.032 * u),
    ]
}

// D65 reference white
const WHITE_X: f32 = 0.950_456;
const WHITE_Z: f32 = 1.088_754;

fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let s = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    clamp_u8(s * 255.0)
}

fn lab_f(t: f32) -> f32 {
    if t > 0.008_856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    let cubed = t * t * t;
    if cubed > 0.008_856 {
        cubed
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

fn rgb_to_lab([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));
    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / WHITE_X;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / WHITE_Z;

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    let l = if y > 0.008_856 { 116.0 * fy - 16.0 } else { 903.3 * y };
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);

    [clamp_u8(l * 255.0 / 100.0), clamp_u8(a + 128.0), clamp_u8(b + 128.0)]
}

fn lab_to_rgb([l, a, b]: [u8; 3]) -> [u8; 3] {
    let l = l as f32 * 100.0 / 255.0;
    let a = a as f32 - 128.0;
    let b = b as f32 - 128.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = lab_f_inv(fx) * WHITE_X;
    let y = if l > 903.3 * 0.008_856 { fy * fy * fy } else { l / 903.3 };
    let z = lab_f_inv(fz) * WHITE_Z;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_992 * y + 0.041_556 * z;
    let bl = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(bl)]
}
