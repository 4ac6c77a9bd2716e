//! Effects configuration
//!
//! [`ConfigManager`] holds the processing settings, drawing and avatar
//! styles, beauty parameters and one [`ModelConfig`] per model. It is built
//! once at startup (defaults, device profile, JSON file, environment) and then
//! handed to each pipeline.
//!
//! JSON import is a partial update: only keys present in the document
//! overwrite the current values.

mod presets;
mod types;
mod validate;

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

pub use presets::{DeviceProfile, PresetSettings, ProfileSettings, QualityPreset};
pub use types::{AvatarConfig, BeautyConfig, DrawingConfig, ModelConfig, ProcessingConfig};
pub use validate::validate;

use crate::error::{EffectsError, Result};
use crate::ml::ModelType;

/// Environment variables read by [`ConfigManager::apply_env`]
pub const ENV_TARGET_FPS: &str = "AI_TARGET_FPS";
pub const ENV_ENABLE_GPU: &str = "AI_ENABLE_GPU";
pub const ENV_QUALITY_PRESET: &str = "AI_QUALITY_PRESET";
pub const ENV_DEBUG_MODE: &str = "AI_DEBUG_MODE";
pub const ENV_BEAUTY_SMOOTHING: &str = "AI_BEAUTY_SMOOTHING";

/// All effect configuration for one pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigManager {
    pub processing: ProcessingConfig,
    pub drawing: DrawingConfig,
    pub avatar: AvatarConfig,
    pub beauty: BeautyConfig,
    models: BTreeMap<ModelType, ModelConfig>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self {
            processing: ProcessingConfig::default(),
            drawing: DrawingConfig::default(),
            avatar: AvatarConfig::default(),
            beauty: BeautyConfig::default(),
            models: ModelType::ALL
                .into_iter()
                .map(|m| (m, ModelConfig::new(m)))
                .collect(),
        }
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recommended starting configuration for a class of device
    pub fn for_device(profile: DeviceProfile) -> Self {
        let settings = profile.settings();
        let mut config = Self::default();
        config.set_quality_preset(settings.preset);
        config.processing.max_resolution = settings.max_resolution;
        config.processing.target_fps = settings.target_fps;
        if let Some(gpu) = settings.enable_gpu {
            config.processing.enable_gpu = gpu;
        }
        tracing::debug!(profile = %profile, "Applied device profile");
        config
    }

    pub fn model(&self, model_type: ModelType) -> &ModelConfig {
        // Every model type is inserted at construction and never removed
        &self.models[&model_type]
    }

    pub fn model_mut(&mut self, model_type: ModelType) -> &mut ModelConfig {
        self.models
            .entry(model_type)
            .or_insert_with(|| ModelConfig::new(model_type))
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelConfig> {
        self.models.values()
    }

    pub fn set_model_config(&mut self, config: ModelConfig) {
        self.models.insert(config.model_type, config);
    }

    pub fn enable_model(&mut self, model_type: ModelType, enabled: bool) {
        self.model_mut(model_type).enabled = enabled;
    }

    pub fn enabled_models(&self) -> Vec<ModelType> {
        self.models
            .values()
            .filter(|m| m.enabled)
            .map(|m| m.model_type)
            .collect()
    }

    /// Rewrite processing and every model's complexity and confidences
    pub fn set_quality_preset(&mut self, preset: QualityPreset) {
        let settings = preset.settings();
        self.processing.quality_preset = preset;
        self.processing.target_fps = settings.target_fps;
        self.processing.max_resolution = settings.max_resolution;

        for model in self.models.values_mut() {
            model.model_complexity = settings.model_complexity;
            model.min_detection_confidence = settings.confidence;
            model.min_tracking_confidence = settings.confidence;
            if let Some(refine) = settings.refine_landmarks {
                model.refine_landmarks = refine;
            }
        }
        tracing::debug!(preset = %preset, "Applied quality preset");
    }

    /// [`set_quality_preset`](Self::set_quality_preset) by name
    pub fn set_quality_preset_str(&mut self, preset: &str) -> Result<()> {
        self.set_quality_preset(preset.parse()?);
        Ok(())
    }

    pub fn validate(&self, gpu_available: bool) -> Vec<String> {
        validate(self, gpu_available)
    }

    /// Export every section as JSON
    pub fn to_value(&self) -> Result<Value> {
        let models: Map<String, Value> = self
            .models
            .iter()
            .map(|(model_type, config)| -> Result<(String, Value)> {
                Ok((model_type.to_string(), serde_json::to_value(config)?))
            })
            .collect::<Result<_>>()?;

        Ok(json!({
            "processing": self.processing.to_value()?,
            "drawing": serde_json::to_value(&self.drawing)?,
            "avatar": serde_json::to_value(&self.avatar)?,
            "beauty": serde_json::to_value(&self.beauty)?,
            "models": models,
        }))
    }

    /// Import the `processing`, `beauty`, `avatar` and `models` sections.
    ///
    /// Only keys present in `value` overwrite current settings. A
    /// `processing.quality_preset` is applied last, so it wins over explicit
    /// fps and resolution values in the same document. The update is applied
    /// only if every section parses.
    pub fn apply_value(&mut self, value: &Value) -> Result<()> {
        let root = value
            .as_object()
            .ok_or_else(|| EffectsError::invalid("configuration must be a JSON object"))?;
        let mut next = self.clone();

        let mut preset = None;
        if let Some(section) = root.get("processing") {
            let mut section = section_object(section, "processing")?.clone();
            if let Some(name) = section.remove("quality_preset") {
                let name = name
                    .as_str()
                    .ok_or_else(|| EffectsError::invalid("quality_preset must be a string"))?;
                preset = Some(name.parse::<QualityPreset>()?);
            }
            next.processing = merge_section(&next.processing, &section)?;
        }
        if let Some(preset) = preset {
            next.set_quality_preset(preset);
        }

        if let Some(section) = root.get("beauty") {
            next.beauty = merge_section(&next.beauty, section_object(section, "beauty")?)?;
        }

        if let Some(section) = root.get("avatar") {
            next.avatar = merge_section(&next.avatar, section_object(section, "avatar")?)?;
        }

        if let Some(section) = root.get("models") {
            for (name, patch) in section_object(section, "models")? {
                let model_type: ModelType = name.parse()?;
                let patch = section_object(patch, name)?;
                let merged: ModelConfig = merge_section(next.model(model_type), patch)?;
                if merged.model_type != model_type {
                    return Err(EffectsError::invalid(format!(
                        "models.{} declares model_type {}",
                        name, merged.model_type
                    )));
                }
                next.set_model_config(merged);
            }
        }

        *self = next;
        Ok(())
    }

    /// Apply the `AI_*` overrides using `lookup` to read variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_TARGET_FPS) {
            self.processing.target_fps = v
                .trim()
                .parse()
                .map_err(|_| env_error(ENV_TARGET_FPS, &v))?;
        }
        if let Some(v) = lookup(ENV_ENABLE_GPU) {
            self.processing.enable_gpu = parse_flag(&v).ok_or_else(|| env_error(ENV_ENABLE_GPU, &v))?;
        }
        if let Some(v) = lookup(ENV_QUALITY_PRESET) {
            self.set_quality_preset_str(&v)?;
        }
        if let Some(v) = lookup(ENV_DEBUG_MODE) {
            self.processing.debug_mode = parse_flag(&v).ok_or_else(|| env_error(ENV_DEBUG_MODE, &v))?;
        }
        if let Some(v) = lookup(ENV_BEAUTY_SMOOTHING) {
            self.beauty.skin_smoothing = v
                .trim()
                .parse()
                .map_err(|_| env_error(ENV_BEAUTY_SMOOTHING, &v))?;
        }
        Ok(())
    }

    /// [`apply_env`](Self::apply_env) against the process environment
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())?;
        tracing::info!("Configuration loaded from environment variables");
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_value()?)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Defaults updated with the contents of a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        let mut config = Self::default();
        config.apply_value(&value)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

fn section_object<'a>(value: &'a Value, name: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| EffectsError::invalid(format!("'{}' must be a JSON object", name)))
}

/// Overlay the keys of `patch` onto the serialized form of `current`
fn merge_section<T>(current: &T, patch: &Map<String, Value>) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = match serde_json::to_value(current)? {
        Value::Object(map) => map,
        _ => return Err(EffectsError::invalid("configuration section is not an object")),
    };
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    Ok(serde_json::from_value(Value::Object(merged))?)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_error(key: &str, value: &str) -> EffectsError {
    EffectsError::invalid(format!("{}={} could not be parsed", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::AvatarType;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ConfigManager::default();
        assert_eq!(config.processing.target_fps, 30);
        assert_eq!(config.processing.max_resolution, (1920, 1080));
        assert!(!config.processing.enable_gpu);
        assert_eq!(config.avatar.avatar_type, AvatarType::Cartoon);
        assert_eq!(config.avatar.face_scale, 1.2);
        assert_eq!(config.enabled_models().len(), 5);
    }

    #[test]
    fn test_performance_preset_rewrites_every_model() {
        let mut config = ConfigManager::default();
        config.set_quality_preset(QualityPreset::Performance);
        assert_eq!(config.processing.max_resolution, (1280, 720));
        for model in config.models() {
            assert_eq!(model.model_complexity, 0);
            assert_eq!(model.min_detection_confidence, 0.6);
            assert_eq!(model.min_tracking_confidence, 0.6);
        }
    }

    #[test]
    fn test_quality_preset_forces_refinement() {
        let mut config = ConfigManager::default();
        for m in ModelType::ALL {
            config.model_mut(m).refine_landmarks = false;
        }
        config.set_quality_preset(QualityPreset::Quality);
        assert_eq!(config.processing.target_fps, 24);
        assert!(config.models().all(|m| m.refine_landmarks && m.model_complexity == 2));
    }

    #[test]
    fn test_balanced_leaves_refinement_alone() {
        let mut config = ConfigManager::default();
        config.model_mut(ModelType::FaceMesh).refine_landmarks = false;
        config.set_quality_preset(QualityPreset::Balanced);
        assert!(!config.model(ModelType::FaceMesh).refine_landmarks);
    }

    #[test]
    fn test_unknown_preset_name() {
        let mut config = ConfigManager::default();
        assert!(config.set_quality_preset_str("ultra").is_err());
        assert_eq!(config, ConfigManager::default());
    }

    #[test]
    fn test_mobile_profile() {
        let config = ConfigManager::for_device(DeviceProfile::Mobile);
        assert_eq!(config.processing.quality_preset, QualityPreset::Performance);
        assert_eq!(config.processing.max_resolution, (640, 480));
        assert_eq!(config.processing.target_fps, 24);
        // Every routed model stays available on mobile
        for model_type in ModelType::ALL {
            assert!(config.model(model_type).enabled, "{} disabled", model_type);
            assert_eq!(config.model(model_type).model_complexity, 0);
        }
    }

    #[test]
    fn test_high_end_profile() {
        let config = ConfigManager::for_device(DeviceProfile::HighEnd);
        assert!(config.processing.enable_gpu);
        assert_eq!(config.processing.target_fps, 30);
        assert_eq!(config.model(ModelType::Pose).model_complexity, 2);
    }

    #[test]
    fn test_apply_value_only_touches_present_keys() {
        let mut config = ConfigManager::default();
        config.beauty.brightness = 1.3;
        config
            .apply_value(&json!({ "beauty": { "skin_smoothing": 0.9 } }))
            .unwrap();
        assert_eq!(config.beauty.skin_smoothing, 0.9);
        assert_eq!(config.beauty.brightness, 1.3);
        assert_eq!(config.processing, ProcessingConfig::default());
    }

    #[test]
    fn test_apply_value_preset_wins_over_fps() {
        let mut config = ConfigManager::default();
        config
            .apply_value(&json!({
                "processing": { "target_fps": 60, "enable_gpu": true, "quality_preset": "quality" }
            }))
            .unwrap();
        assert_eq!(config.processing.target_fps, 24);
        assert!(config.processing.enable_gpu);
        assert_eq!(config.processing.quality_preset, QualityPreset::Quality);
    }

    #[test]
    fn test_apply_value_models_and_avatar() {
        let mut config = ConfigManager::default();
        config
            .apply_value(&json!({
                "avatar": { "avatar_type": "neon", "face_scale": 1.5 },
                "models": { "hands": { "max_instances": 1, "enabled": false } }
            }))
            .unwrap();
        assert_eq!(config.avatar.avatar_type, AvatarType::Neon);
        assert_eq!(config.avatar.face_scale, 1.5);
        assert_eq!(config.model(ModelType::Hands).max_instances, 1);
        assert!(!config.model(ModelType::Hands).enabled);
    }

    #[test]
    fn test_apply_value_is_all_or_nothing() {
        let mut config = ConfigManager::default();
        let result = config.apply_value(&json!({
            "beauty": { "skin_smoothing": 0.1 },
            "models": { "holistic": { "enabled": true } }
        }));
        assert!(result.is_err());
        assert_eq!(config.beauty.skin_smoothing, 0.5);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut original = ConfigManager::for_device(DeviceProfile::Tablet);
        original.beauty.skin_smoothing = 0.8;
        original.avatar.avatar_type = AvatarType::Robot;

        let mut restored = ConfigManager::default();
        restored.apply_value(&original.to_value().unwrap()).unwrap();
        assert_eq!(restored.beauty, original.beauty);
        assert_eq!(restored.avatar, original.avatar);
        assert_eq!(restored.processing.quality_preset, QualityPreset::Balanced);
        for m in ModelType::ALL {
            assert_eq!(restored.model(m), original.model(m));
        }
    }

    #[test]
    fn test_processing_round_trip_for_all_presets() {
        for preset in QualityPreset::ALL {
            let mut config = ConfigManager::default();
            config.set_quality_preset(preset);
            let value = config.processing.to_value().unwrap();
            let back = ProcessingConfig::from_value(&value).unwrap();
            assert_eq!(back.target_fps, config.processing.target_fps);
            assert_eq!(back.max_resolution, config.processing.max_resolution);
            assert_eq!(back, config.processing);
        }
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_TARGET_FPS, "45"),
            (ENV_ENABLE_GPU, "TRUE"),
            (ENV_DEBUG_MODE, "false"),
            (ENV_BEAUTY_SMOOTHING, "0.75"),
        ]
        .into_iter()
        .collect();
        let mut config = ConfigManager::default();
        config
            .apply_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.processing.target_fps, 45);
        assert!(config.processing.enable_gpu);
        assert!(!config.processing.debug_mode);
        assert_eq!(config.beauty.skin_smoothing, 0.75);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = ConfigManager::default();
        let err = config
            .apply_env(|k| (k == ENV_TARGET_FPS).then(|| "fast".to_string()))
            .unwrap_err();
        assert!(matches!(err, EffectsError::InvalidArgument(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("effects.json");

        let mut config = ConfigManager::for_device(DeviceProfile::Mobile);
        config.beauty.contrast = 1.2;
        config.save(&path).unwrap();

        let loaded = ConfigManager::load(&path).unwrap();
        assert_eq!(loaded.processing.quality_preset, QualityPreset::Performance);
        assert_eq!(loaded.beauty.contrast, 1.2);
        assert!(loaded.model(ModelType::Pose).enabled);
    }
}
