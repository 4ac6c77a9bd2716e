//! Beauty filter: smoothed and brightened skin inside detected faces

use image::{GenericImageView, Rgb, RgbImage};

use crate::config::BeautyConfig;
use crate::imaging::filter::{bilateral_filter, convert_scale_abs};
use crate::ml::Detection;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeautyParams {
    pub diameter: u32,
    /// Used for both the color and the spatial sigma
    pub sigma: f32,
    /// Gain on the smoothed face
    pub alpha: f32,
    /// Offset on the smoothed face
    pub beta: f32,
}

impl Default for BeautyParams {
    fn default() -> Self {
        Self::from(&BeautyConfig::default())
    }
}

impl From<&BeautyConfig> for BeautyParams {
    fn from(config: &BeautyConfig) -> Self {
        Self {
            diameter: 9,
            sigma: 75.0 * config.skin_smoothing,
            alpha: config.contrast,
            beta: (config.brightness - 1.0) * 50.0,
        }
    }
}

/// Replace each face box with its smoothed, rescaled version.
///
/// Only the boxes are filtered. Each box is cropped with a margin of the
/// filter radius, which gives the same pixels as filtering the whole frame.
pub fn render(image: &RgbImage, faces: &[Detection], params: &BeautyParams) -> RgbImage {
    let mut out = image.clone();
    let (width, height) = image.dimensions();
    let margin = (params.diameter / 2).max(1);

    for face in faces {
        let bbox = face.bbox.to_pixels(width, height);
        let x0 = bbox.xmin.floor() as u32;
        let y0 = bbox.ymin.floor() as u32;
        let x1 = (bbox.xmax.ceil() as u32).min(width);
        let y1 = (bbox.ymax.ceil() as u32).min(height);
        if x1 <= x0 || y1 <= y0 {
            continue;
        }

        let cx0 = x0.saturating_sub(margin);
        let cy0 = y0.saturating_sub(margin);
        let cx1 = (x1 + margin).min(width);
        let cy1 = (y1 + margin).min(height);
        let crop = image.view(cx0, cy0, cx1 - cx0, cy1 - cy0).to_image();
        let smoothed = bilateral_filter(&crop, params.diameter, params.sigma, params.sigma);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = smoothed.get_pixel(x - cx0, y - cy0).0;
                out.put_pixel(
                    x,
                    y,
                    Rgb([
                        convert_scale_abs(p[0], params.alpha, params.beta),
                        convert_scale_abs(p[1], params.alpha, params.beta),
                        convert_scale_abs(p[2], params.alpha, params.beta),
                    ]),
                );
            }
        }
    }
    out
}
