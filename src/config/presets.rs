//! Quality presets and device profiles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EffectsError, Result};

/// Trade-off between speed and model accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Performance,
    #[default]
    Balanced,
    Quality,
}

/// What a preset writes into the configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetSettings {
    pub target_fps: u32,
    pub max_resolution: (u32, u32),
    pub model_complexity: u8,
    /// Applied to both detection and tracking confidence
    pub confidence: f32,
    /// `Some(true)` forces landmark refinement on; `None` leaves it alone
    pub refine_landmarks: Option<bool>,
}

impl QualityPreset {
    pub const ALL: [QualityPreset; 3] = [
        QualityPreset::Performance,
        QualityPreset::Balanced,
        QualityPreset::Quality,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QualityPreset::Performance => "performance",
            QualityPreset::Balanced => "balanced",
            QualityPreset::Quality => "quality",
        }
    }

    pub fn settings(self) -> PresetSettings {
        match self {
            QualityPreset::Performance => PresetSettings {
                target_fps: 30,
                max_resolution: (1280, 720),
                model_complexity: 0,
                confidence: 0.6,
                refine_landmarks: None,
            },
            QualityPreset::Balanced => PresetSettings {
                target_fps: 30,
                max_resolution: (1920, 1080),
                model_complexity: 1,
                confidence: 0.5,
                refine_landmarks: None,
            },
            QualityPreset::Quality => PresetSettings {
                target_fps: 24,
                max_resolution: (1920, 1080),
                model_complexity: 2,
                confidence: 0.4,
                refine_landmarks: Some(true),
            },
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityPreset {
    type Err = EffectsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        QualityPreset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| EffectsError::invalid(format!("unknown quality preset '{}'", s)))
    }
}

/// Hardware class used to pick a starting configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceProfile {
    Mobile,
    Tablet,
    Desktop,
    HighEnd,
}

/// Everything a device profile decides
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSettings {
    pub preset: QualityPreset,
    pub max_resolution: (u32, u32),
    pub target_fps: u32,
    /// `Some` overrides the GPU flag after the preset is applied
    pub enable_gpu: Option<bool>,
}

impl DeviceProfile {
    pub const ALL: [DeviceProfile; 4] = [
        DeviceProfile::Mobile,
        DeviceProfile::Tablet,
        DeviceProfile::Desktop,
        DeviceProfile::HighEnd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceProfile::Mobile => "mobile",
            DeviceProfile::Tablet => "tablet",
            DeviceProfile::Desktop => "desktop",
            DeviceProfile::HighEnd => "high_end",
        }
    }

    pub fn settings(self) -> ProfileSettings {
        match self {
            DeviceProfile::Mobile => ProfileSettings {
                preset: QualityPreset::Performance,
                max_resolution: (640, 480),
                target_fps: 24,
                enable_gpu: None,
            },
            DeviceProfile::Tablet => ProfileSettings {
                preset: QualityPreset::Balanced,
                max_resolution: (1280, 720),
                target_fps: 30,
                enable_gpu: None,
            },
            DeviceProfile::Desktop => ProfileSettings {
                preset: QualityPreset::Balanced,
                max_resolution: (1920, 1080),
                target_fps: 30,
                enable_gpu: None,
            },
            DeviceProfile::HighEnd => ProfileSettings {
                preset: QualityPreset::Quality,
                max_resolution: (1920, 1080),
                target_fps: 30,
                enable_gpu: Some(true),
            },
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceProfile {
    type Err = EffectsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase().replace('-', "_");
        DeviceProfile::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| EffectsError::invalid(format!("unknown device profile '{}'", s)))
    }
}
