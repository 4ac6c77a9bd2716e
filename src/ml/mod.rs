//! Inference contract
//!
//! Effects never talk to an ML runtime directly. They consume [`Prediction`]s
//! produced by an [`InferenceEngine`], which owns one slot per [`ModelType`].
//! Models are built by a [`ModelLoader`]; a model that fails to load leaves an
//! explicit `Unavailable` slot behind instead of aborting startup.
//!
//! Two loaders ship with the crate: [`onnx::OnnxLoader`] runs the selfie
//! segmentation network through ONNX Runtime, and [`replay::ReplayLoader`]
//! serves predictions recorded as JSON.

pub mod onnx;
pub mod replay;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigManager, ModelConfig};
use crate::detection::RelativeBox;
use crate::error::{EffectsError, Result};

/// The ML models an effect can depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    SelfieSegmentation,
    FaceDetection,
    FaceMesh,
    Pose,
    Hands,
}

impl ModelType {
    pub const ALL: [ModelType; 5] = [
        ModelType::SelfieSegmentation,
        ModelType::FaceDetection,
        ModelType::FaceMesh,
        ModelType::Pose,
        ModelType::Hands,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::SelfieSegmentation => "selfie_segmentation",
            ModelType::FaceDetection => "face_detection",
            ModelType::FaceMesh => "face_mesh",
            ModelType::Pose => "pose",
            ModelType::Hands => "hands",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = EffectsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        ModelType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| EffectsError::invalid(format!("unknown model type '{}'", s)))
    }
}

/// Normalized landmark; `x` and `y` are fractions of the frame size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Ordered landmarks for one detected instance (a face, a body, a hand)
pub type LandmarkSet = Vec<Landmark>;

/// Person segmentation mask (0.0 = background, 1.0 = person)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl SegmentationMask {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(EffectsError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Get mask value at normalized coordinates
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 0.0;
        }
        let px = (x * self.width as f32) as u32;
        let py = (y * self.height as f32) as u32;
        let idx = (py.min(self.height - 1) * self.width + px.min(self.width - 1)) as usize;
        self.data.get(idx).copied().unwrap_or(0.0)
    }
}

/// One detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: RelativeBox,
    pub score: f32,
    #[serde(default)]
    pub keypoints: Vec<Landmark>,
}

/// Output of one model invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prediction {
    Mask(SegmentationMask),
    Landmarks { sets: Vec<LandmarkSet> },
    Detections { detections: Vec<Detection> },
}

impl Prediction {
    pub fn kind(&self) -> &'static str {
        match self {
            Prediction::Mask(_) => "mask",
            Prediction::Landmarks { .. } => "landmarks",
            Prediction::Detections { .. } => "detections",
        }
    }

    /// Whether the model found nothing in the frame
    pub fn is_empty(&self) -> bool {
        match self {
            Prediction::Mask(mask) => mask.data.is_empty(),
            Prediction::Landmarks { sets } => sets.is_empty(),
            Prediction::Detections { detections } => detections.is_empty(),
        }
    }
}

/// A loaded model: RGB image in, one prediction out
pub trait Model: Send {
    fn model_type(&self) -> ModelType;

    fn predict(&mut self, image: &RgbImage) -> Result<Prediction>;
}

/// Builds models on demand
pub trait ModelLoader {
    fn load(&self, model_type: ModelType, config: &ModelConfig) -> Result<Box<dyn Model>>;
}

/// Tries each loader in turn and keeps the first model that loads
pub struct FallbackLoader {
    loaders: Vec<Box<dyn ModelLoader>>,
}

impl FallbackLoader {
    pub fn new(loaders: Vec<Box<dyn ModelLoader>>) -> Self {
        Self { loaders }
    }
}

impl ModelLoader for FallbackLoader {
    fn load(&self, model_type: ModelType, config: &ModelConfig) -> Result<Box<dyn Model>> {
        let mut reasons = Vec::new();
        for loader in &self.loaders {
            match loader.load(model_type, config) {
                Ok(model) => return Ok(model),
                Err(e) => reasons.push(e.to_string()),
            }
        }
        if reasons.is_empty() {
            reasons.push("no loaders configured".to_string());
        }
        Err(EffectsError::inference(model_type, reasons.join("; ")))
    }
}

/// State of one model in the engine
pub enum ModelSlot {
    Ready(Box<dyn Model>),
    /// Turned off in the configuration; never loaded
    Disabled,
    /// Loading failed; the reason is kept for diagnostics
    Unavailable { reason: String },
}

impl fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSlot::Ready(model) => write!(f, "Ready({})", model.model_type()),
            ModelSlot::Disabled => f.write_str("Disabled"),
            ModelSlot::Unavailable { reason } => write!(f, "Unavailable({})", reason),
        }
    }
}

/// Readable summary of a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    Ready,
    Disabled,
    Unavailable(String),
}

struct EngineEntry {
    config: ModelConfig,
    slot: ModelSlot,
}

/// Owns every model used by one pipeline
pub struct InferenceEngine {
    entries: BTreeMap<ModelType, EngineEntry>,
}

impl InferenceEngine {
    /// An engine with no models; every effect that needs one passes frames through
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Load every enabled model.
    ///
    /// Failures never abort construction: the slot becomes `Unavailable`, the
    /// model is disabled in `config`, and a warning is logged.
    pub fn load(loader: &dyn ModelLoader, config: &mut ConfigManager) -> Self {
        let mut engine = Self::empty();

        for model_type in ModelType::ALL {
            let model_config = config.model(model_type).clone();
            if !model_config.enabled {
                tracing::debug!(model = %model_type, "Model disabled, not loading");
                engine.entries.insert(
                    model_type,
                    EngineEntry {
                        config: model_config,
                        slot: ModelSlot::Disabled,
                    },
                );
                continue;
            }

            let slot = match loader.load(model_type, &model_config) {
                Ok(model) => {
                    tracing::info!(model = %model_type, "Model loaded");
                    ModelSlot::Ready(model)
                }
                Err(e) => {
                    tracing::warn!(model = %model_type, error = %e, "Model unavailable, disabling");
                    config.enable_model(model_type, false);
                    ModelSlot::Unavailable {
                        reason: e.to_string(),
                    }
                }
            };
            engine.entries.insert(
                model_type,
                EngineEntry {
                    config: model_config,
                    slot,
                },
            );
        }

        engine
    }

    /// Install an already-built model, replacing whatever slot was there
    pub fn insert(&mut self, model: Box<dyn Model>, config: ModelConfig) {
        self.entries.insert(
            model.model_type(),
            EngineEntry {
                config,
                slot: ModelSlot::Ready(model),
            },
        );
    }

    pub fn status(&self, model_type: ModelType) -> ModelStatus {
        match self.entries.get(&model_type).map(|e| &e.slot) {
            Some(ModelSlot::Ready(_)) => ModelStatus::Ready,
            Some(ModelSlot::Disabled) => ModelStatus::Disabled,
            Some(ModelSlot::Unavailable { reason }) => ModelStatus::Unavailable(reason.clone()),
            None => ModelStatus::Unavailable("not loaded".to_string()),
        }
    }

    pub fn is_ready(&self, model_type: ModelType) -> bool {
        self.status(model_type) == ModelStatus::Ready
    }

    /// Run a model on an RGB image.
    ///
    /// Returns `Ok(None)` when the model has no ready slot, which callers must
    /// treat differently from an empty prediction. Detections scoring below
    /// the model's `min_detection_confidence` are dropped.
    pub fn infer(&mut self, model_type: ModelType, image: &RgbImage) -> Result<Option<Prediction>> {
        let Some(entry) = self.entries.get_mut(&model_type) else {
            return Ok(None);
        };
        let ModelSlot::Ready(model) = &mut entry.slot else {
            return Ok(None);
        };

        let prediction = model.predict(image)?;
        Ok(Some(filter_by_confidence(prediction, &entry.config)))
    }
}

fn filter_by_confidence(prediction: Prediction, config: &ModelConfig) -> Prediction {
    match prediction {
        Prediction::Detections { detections } => Prediction::Detections {
            detections: detections
                .into_iter()
                .filter(|d| d.score >= config.min_detection_confidence)
                .collect(),
        },
        other => other,
    }
}
