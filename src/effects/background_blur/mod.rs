//! Background blur
//!
//! Keeps the segmented person sharp and replaces everything else with a
//! heavily blurred copy of the frame.

use image::RgbImage;

use crate::imaging::gaussian_blur;
use crate::ml::SegmentationMask;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParams {
    /// Gaussian kernel size for the background
    pub kernel_size: u32,
    /// Mask values strictly above this are foreground
    pub threshold: f32,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            kernel_size: 55,
            threshold: 0.1,
        }
    }
}

/// Select the original pixel where the mask marks foreground, the blurred
/// pixel elsewhere. A mask of a different size is sampled at each pixel's
/// normalized position.
pub fn render(image: &RgbImage, mask: &SegmentationMask, params: &BlurParams) -> RgbImage {
    let background = gaussian_blur(image, params.kernel_size);
    let (width, height) = image.dimensions();
    let same_size = mask.width == width && mask.height == height;

    RgbImage::from_fn(width, height, |x, y| {
        let value = if same_size {
            mask.data
                .get((y * width + x) as usize)
                .copied()
                .unwrap_or(0.0)
        } else {
            mask.sample(
                (x as f32 + 0.5) / width as f32,
                (y as f32 + 0.5) / height as f32,
            )
        };

        if value > params.threshold {
            *image.get_pixel(x, y)
        } else {
            *background.get_pixel(x, y)
        }
    })
}
