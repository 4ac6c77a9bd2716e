//! Video frame type
//!
//! A frame owns its pixel buffer. Effects never mutate a frame in place: the
//! pipeline either hands the input back untouched or builds a new frame that
//! carries the input's timestamp and time-base.

use std::fmt;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{EffectsError, Result};
use crate::imaging::{convert_color_space, ColorSpace};

/// Pixel layout of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Bgr24,
    Rgb24,
    Gray8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Bgr24 | PixelFormat::Rgb24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }

    fn color_space(self) -> ColorSpace {
        match self {
            PixelFormat::Bgr24 => ColorSpace::Bgr,
            PixelFormat::Rgb24 => ColorSpace::Rgb,
            PixelFormat::Gray8 => ColorSpace::Gray,
        }
    }
}

/// Rational time unit of a frame's timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBase {
    pub num: i32,
    pub den: i32,
}

impl TimeBase {
    /// The 90 kHz clock used by RTP video
    pub const VIDEO_90K: TimeBase = TimeBase { num: 1, den: 90_000 };
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::VIDEO_90K
    }
}

impl fmt::Display for TimeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// One video frame
#[derive(Clone, PartialEq)]
pub struct Frame {
    /// Interleaved pixel data, row-major, no padding
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Presentation timestamp in `time_base` units
    pub pts: Option<i64>,
    pub time_base: TimeBase,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("pts", &self.pts)
            .field("time_base", &self.time_base)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Frame {
    /// Wrap a pixel buffer, checking its length against the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let expected = width as usize * height as usize * format.channels();
        if data.len() != expected {
            return Err(EffectsError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
            pts: None,
            time_base: TimeBase::default(),
        })
    }

    pub fn with_timing(mut self, pts: Option<i64>, time_base: TimeBase) -> Self {
        self.pts = pts;
        self.time_base = time_base;
        self
    }

    /// Build an RGB24 frame from a decoded image
    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            format: PixelFormat::Rgb24,
            pts: None,
            time_base: TimeBase::default(),
        }
    }

    /// Copy the frame into an RGB image, the input layout every model expects.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        let rgb = match self.format {
            PixelFormat::Rgb24 => self.data.clone(),
            other => convert_color_space(&self.data, other.color_space(), ColorSpace::Rgb)?,
        };
        let expected = self.width as usize * self.height as usize * 3;
        let actual = rgb.len();
        RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or(EffectsError::BufferSize { expected, actual })
    }

    /// Build the output frame for this input: same format, same timing.
    pub fn derive(&self, image: RgbImage) -> Result<Frame> {
        let (width, height) = image.dimensions();
        let data = match self.format {
            PixelFormat::Rgb24 => image.into_raw(),
            other => convert_color_space(image.as_raw(), ColorSpace::Rgb, other.color_space())?,
        };
        Ok(Frame {
            data,
            width,
            height,
            format: self.format,
            pts: self.pts,
            time_base: self.time_base,
        })
    }
}
