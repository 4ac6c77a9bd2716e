//! Configuration sanity checks

use super::ConfigManager;

const MAX_SENSIBLE_FPS: u32 = 60;
const MAX_CONCURRENT_MODELS: usize = 3;
const MIN_SENSIBLE_CONFIDENCE: f32 = 0.3;
const HEAVY_COMPLEXITY_FPS_LIMIT: u32 = 25;

/// Collect warnings about settings likely to hurt quality or frame rate.
///
/// Never fails; an empty list means nothing looked suspicious.
pub fn validate(config: &ConfigManager, gpu_available: bool) -> Vec<String> {
    let mut warnings = Vec::new();
    let processing = &config.processing;

    if processing.target_fps > MAX_SENSIBLE_FPS {
        warnings.push(format!(
            "Target FPS {} > {} may cause performance issues",
            processing.target_fps, MAX_SENSIBLE_FPS
        ));
    }

    if processing.enable_gpu && !gpu_available {
        warnings.push("GPU enabled but no compatible GPU detected".to_string());
    }

    let enabled = config.enabled_models();
    if enabled.len() > MAX_CONCURRENT_MODELS {
        warnings.push(format!(
            "Running {} models simultaneously may impact performance",
            enabled.len()
        ));
    }

    for model in config.models() {
        if model.min_detection_confidence < MIN_SENSIBLE_CONFIDENCE {
            warnings.push(format!(
                "{}: Low detection confidence may cause false positives",
                model.model_type
            ));
        }
        if model.model_complexity > 1 && processing.target_fps > HEAVY_COMPLEXITY_FPS_LIMIT {
            warnings.push(format!(
                "{}: High complexity with high FPS may not be achievable",
                model.model_type
            ));
        }
    }

    warnings
}
