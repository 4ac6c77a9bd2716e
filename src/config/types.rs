//! Configuration value objects

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::presets::QualityPreset;
use crate::control::AvatarType;
use crate::error::Result;
use crate::ml::ModelType;

/// Parameters for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_type: ModelType,
    pub enabled: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    /// 0 = lite, 1 = full, 2 = heavy
    pub model_complexity: u8,
    /// Most faces or hands reported per frame
    pub max_instances: u32,
    pub static_image_mode: bool,
    pub refine_landmarks: bool,
    pub enable_segmentation: bool,
    pub smooth_segmentation: bool,
    /// Free-form options passed through to a model loader
    #[serde(default)]
    pub custom_options: Map<String, Value>,
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        let max_instances = match model_type {
            ModelType::Hands => 2,
            _ => 1,
        };
        Self {
            model_type,
            enabled: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            model_complexity: 1,
            max_instances,
            static_image_mode: false,
            refine_landmarks: true,
            enable_segmentation: false,
            smooth_segmentation: true,
            custom_options: Map::new(),
        }
    }
}

/// Global processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub target_fps: u32,
    /// Largest frame (width, height) the pipeline is tuned for
    pub max_resolution: (u32, u32),
    pub enable_gpu: bool,
    pub thread_count: usize,
    pub buffer_size: usize,
    pub quality_preset: QualityPreset,
    pub debug_mode: bool,
    pub enable_performance_logging: bool,
    /// Log a telemetry summary every N processed frames
    pub performance_log_interval: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            max_resolution: (1920, 1080),
            enable_gpu: false,
            thread_count: 4,
            buffer_size: 3,
            quality_preset: QualityPreset::Balanced,
            debug_mode: false,
            enable_performance_logging: true,
            performance_log_interval: 100,
        }
    }
}

impl ProcessingConfig {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Build from a JSON object; missing keys take their defaults
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }
}

/// Colors (RGB) and sizes for landmark overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    pub landmark_color: [u8; 3],
    pub landmark_radius: i32,
    pub connection_color: [u8; 3],
    pub connection_thickness: u32,
    pub bounding_box_color: [u8; 3],
    pub bounding_box_thickness: u32,
    pub overlay_alpha: f32,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            landmark_color: [0, 255, 0],
            landmark_radius: 2,
            connection_color: [0, 200, 0],
            connection_thickness: 1,
            bounding_box_color: [0, 0, 255],
            bounding_box_thickness: 2,
            overlay_alpha: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub avatar_type: AvatarType,
    /// Multiplier on feature sizes derived from the inter-eye distance
    pub face_scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub rotation_smoothing: f32,
    pub position_smoothing: f32,
    pub enable_expression_tracking: bool,
    pub mirror_avatar: bool,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            avatar_type: AvatarType::Cartoon,
            face_scale: 1.2,
            offset_x: 0.0,
            offset_y: -0.1,
            rotation_smoothing: 0.8,
            position_smoothing: 0.7,
            enable_expression_tracking: true,
            mirror_avatar: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeautyConfig {
    /// 0.0 (off) to 1.0 (strongest)
    pub skin_smoothing: f32,
    /// Multiplicative; 1.0 leaves brightness unchanged
    pub brightness: f32,
    /// Gain applied to smoothed skin
    pub contrast: f32,
    pub saturation: f32,
    pub sharpening: f32,
    pub eye_enhancement: f32,
    pub teeth_whitening: f32,
    pub face_slimming: f32,
    pub enable_auto_adjustment: bool,
}

impl Default for BeautyConfig {
    fn default() -> Self {
        Self {
            skin_smoothing: 0.5,
            brightness: 1.1,
            contrast: 1.05,
            saturation: 1.1,
            sharpening: 0.2,
            eye_enhancement: 0.3,
            teeth_whitening: 0.2,
            face_slimming: 0.0,
            enable_auto_adjustment: true,
        }
    }
}
