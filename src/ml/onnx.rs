//! ONNX Runtime adapter
//!
//! Runs the MediaPipe selfie segmentation network (PINTO Model Zoo export)
//! through ONNX Runtime. The runtime library is loaded dynamically, so a host
//! without it simply ends up with an `Unavailable` segmentation slot.

use std::path::{Path, PathBuf};
use std::sync::Once;

use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;

use super::{Model, ModelLoader, ModelType, Prediction, SegmentationMask};
use crate::config::ModelConfig;
use crate::error::{EffectsError, Result};

const GENERAL_MODEL: &str = "selfie_segmentation.onnx";
const LANDSCAPE_MODEL: &str = "selfie_segmentation_landscape.onnx";

static ORT_INIT: Once = Once::new();

/// Loads ONNX models from a directory
#[derive(Debug, Clone)]
pub struct OnnxLoader {
    model_dir: PathBuf,
    intra_threads: usize,
}

impl OnnxLoader {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            intra_threads: 2,
        }
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads.max(1);
        self
    }

    /// Look for a `models` directory next to the executable, a few levels up
    /// (for `target/debug` builds), then in the working directory.
    pub fn find_model_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe() {
            for ancestor in exe_path.ancestors().skip(1).take(3) {
                let model_dir = ancestor.join("models");
                if model_dir.is_dir() {
                    return Some(model_dir);
                }
            }
        }

        let model_dir = std::env::current_dir().ok()?.join("models");
        model_dir.is_dir().then_some(model_dir)
    }

    /// Landscape variant for complexity >= 1 when present, the general model otherwise
    fn segmentation_path(&self, config: &ModelConfig) -> (PathBuf, SegmentationVariant) {
        let landscape = self.model_dir.join(LANDSCAPE_MODEL);
        if config.model_complexity >= 1 && landscape.exists() {
            (landscape, SegmentationVariant::Landscape)
        } else {
            (self.model_dir.join(GENERAL_MODEL), SegmentationVariant::General)
        }
    }
}

impl ModelLoader for OnnxLoader {
    fn load(&self, model_type: ModelType, config: &ModelConfig) -> Result<Box<dyn Model>> {
        if model_type != ModelType::SelfieSegmentation {
            return Err(EffectsError::inference(model_type, "no ONNX adapter for this model"));
        }

        let (path, variant) = self.segmentation_path(config);
        if !path.exists() {
            return Err(EffectsError::inference(
                model_type,
                format!("segmentation model not found: {}", path.display()),
            ));
        }

        let model = OnnxSegmentation::open(&path, variant, self.intra_threads)?;
        tracing::info!(path = %path.display(), ?variant, "Loaded segmentation model");
        Ok(Box::new(model))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentationVariant {
    /// 256×256 input
    General,
    /// 256 wide × 144 high input
    Landscape,
}

impl SegmentationVariant {
    fn input_size(self) -> (u32, u32) {
        match self {
            SegmentationVariant::General => (256, 256),
            SegmentationVariant::Landscape => (256, 144),
        }
    }
}

/// Person segmentation session
pub struct OnnxSegmentation {
    session: Session,
    variant: SegmentationVariant,
}

impl OnnxSegmentation {
    fn open(path: &Path, variant: SegmentationVariant, intra_threads: usize) -> Result<Self> {
        let model = ModelType::SelfieSegmentation;

        ORT_INIT.call_once(|| {
            if let Err(e) = ort::init().with_name("StreamEffects").commit() {
                tracing::warn!(error = %e, "Failed to initialize ONNX Runtime environment");
            }
        });

        let session = Session::builder()
            .map_err(|e| EffectsError::inference(model, format!("session builder: {}", e)))?
            .with_intra_threads(intra_threads)
            .map_err(|e| EffectsError::inference(model, format!("set threads: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| EffectsError::inference(model, format!("load {}: {}", path.display(), e)))?;

        Ok(Self { session, variant })
    }
}

impl Model for OnnxSegmentation {
    fn model_type(&self) -> ModelType {
        ModelType::SelfieSegmentation
    }

    fn predict(&mut self, image: &RgbImage) -> Result<Prediction> {
        let model = ModelType::SelfieSegmentation;
        let (width, height) = self.variant.input_size();

        let input = preprocess_nhwc(image, width, height);
        let input_array = Array4::from_shape_vec((1, height as usize, width as usize, 3), input)
            .map_err(|e| EffectsError::inference(model, format!("input array: {}", e)))?;
        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| EffectsError::inference(model, format!("input tensor: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| EffectsError::inference(model, e))?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| EffectsError::inference(model, "model produced no output"))?;

        let (_shape, data) = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| EffectsError::inference(model, format!("extract output: {}", e)))?;

        let mask: Vec<f32> = data.iter().map(|&v| v.clamp(0.0, 1.0)).collect();
        Ok(Prediction::Mask(SegmentationMask::new(width, height, mask)?))
    }
}

/// Nearest-neighbour resize to `width × height`, RGB scaled to [0, 1], HWC order
fn preprocess_nhwc(image: &RgbImage, width: u32, height: u32) -> Vec<f32> {
    let mut output = vec![0.0f32; (width * height * 3) as usize];
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return output;
    }

    let x_ratio = src_w as f32 / width as f32;
    let y_ratio = src_h as f32 / height as f32;

    for y in 0..height {
        for x in 0..width {
            let src_x = ((x as f32 * x_ratio) as u32).min(src_w - 1);
            let src_y = ((y as f32 * y_ratio) as u32).min(src_h - 1);
            let p = image.get_pixel(src_x, src_y).0;

            let out_idx = ((y * width + x) * 3) as usize;
            output[out_idx] = p[0] as f32 / 255.0;
            output[out_idx + 1] = p[1] as f32 / 255.0;
            output[out_idx + 2] = p[2] as f32 / 255.0;
        }
    }

    output
}
