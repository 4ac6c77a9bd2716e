//! Error types shared across the crate

use thiserror::Error;

use crate::imaging::ColorSpace;
use crate::ml::ModelType;

/// Errors produced by the effects pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum EffectsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unsupported color conversion: {from} to {to}")]
    UnsupportedConversion { from: ColorSpace, to: ColorSpace },
    #[error("Inference failed for {model}: {message}")]
    Inference { model: ModelType, message: String },
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl EffectsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn inference(model: ModelType, message: impl std::fmt::Display) -> Self {
        Self::Inference {
            model,
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EffectsError>;
