//! Recorded predictions
//!
//! Replays predictions captured from a real inference engine. A replay
//! directory holds one `<model_type>.json` file per model, containing either a
//! single prediction or an array that is cycled frame by frame.

use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::Deserialize;

use super::{Model, ModelLoader, ModelType, Prediction};
use crate::config::ModelConfig;
use crate::error::{EffectsError, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum Recording {
    Sequence(Vec<Prediction>),
    Single(Prediction),
}

/// Model that returns recorded predictions in order, wrapping around
pub struct ReplayModel {
    model_type: ModelType,
    predictions: Vec<Prediction>,
    cursor: usize,
}

impl ReplayModel {
    pub fn new(model_type: ModelType, predictions: Vec<Prediction>) -> Self {
        Self {
            model_type,
            predictions,
            cursor: 0,
        }
    }

    /// Read a recording from a JSON file
    pub fn from_file(model_type: ModelType, path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let predictions = match serde_json::from_str::<Recording>(&contents)? {
            Recording::Sequence(predictions) => predictions,
            Recording::Single(prediction) => vec![prediction],
        };

        if predictions.is_empty() {
            return Err(EffectsError::inference(
                model_type,
                format!("{} holds no predictions", path.display()),
            ));
        }
        let expected = expected_kind(model_type);
        if let Some(bad) = predictions.iter().find(|p| p.kind() != expected) {
            return Err(EffectsError::inference(
                model_type,
                format!("recorded {} prediction, expected {}", bad.kind(), expected),
            ));
        }

        Ok(Self::new(model_type, predictions))
    }
}

impl Model for ReplayModel {
    fn model_type(&self) -> ModelType {
        self.model_type
    }

    fn predict(&mut self, _image: &RgbImage) -> Result<Prediction> {
        let prediction = self
            .predictions
            .get(self.cursor % self.predictions.len().max(1))
            .cloned()
            .ok_or_else(|| EffectsError::inference(self.model_type, "recording is empty"))?;
        self.cursor = self.cursor.wrapping_add(1);
        Ok(prediction)
    }
}

/// Loads [`ReplayModel`]s from a directory of recordings
#[derive(Debug, Clone)]
pub struct ReplayLoader {
    dir: PathBuf,
}

impl ReplayLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, model_type: ModelType) -> PathBuf {
        self.dir.join(format!("{}.json", model_type))
    }
}

impl ModelLoader for ReplayLoader {
    fn load(&self, model_type: ModelType, _config: &ModelConfig) -> Result<Box<dyn Model>> {
        let path = self.path_for(model_type);
        if !path.exists() {
            return Err(EffectsError::inference(
                model_type,
                format!("no recording at {}", path.display()),
            ));
        }
        let model = ReplayModel::from_file(model_type, &path)?;
        tracing::debug!(model = %model_type, path = %path.display(), "Loaded replay recording");
        Ok(Box::new(model))
    }
}

fn expected_kind(model_type: ModelType) -> &'static str {
    match model_type {
        ModelType::SelfieSegmentation => "mask",
        ModelType::FaceDetection => "detections",
        ModelType::FaceMesh | ModelType::Pose | ModelType::Hands => "landmarks",
    }
}
