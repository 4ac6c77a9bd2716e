//! Effect selection shared with the control plane
//!
//! The control plane writes the selected mode and avatar style through a
//! [`ControlHandle`]; the pipeline copies the pair out once per frame, so a
//! change lands on the next frame boundary.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::ml::ModelType;

/// Effect mode applied to every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    None,
    Blur,
    FaceDetection,
    PoseEstimation,
    EdgeDetection,
    FaceMesh,
    Avatar,
    Hands,
    Beauty,
    Cartoon,
}

impl Mode {
    pub const ALL: [Mode; 10] = [
        Mode::None,
        Mode::Blur,
        Mode::FaceDetection,
        Mode::PoseEstimation,
        Mode::EdgeDetection,
        Mode::FaceMesh,
        Mode::Avatar,
        Mode::Hands,
        Mode::Beauty,
        Mode::Cartoon,
    ];

    /// Parse a control-plane id. Unknown ids select [`Mode::None`].
    pub fn from_id(id: &str) -> Self {
        let id = id.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.id() == id)
            .unwrap_or(Mode::None)
    }

    pub fn id(self) -> &'static str {
        match self {
            Mode::None => "none",
            Mode::Blur => "blur",
            Mode::FaceDetection => "face-detection",
            Mode::PoseEstimation => "pose-estimation",
            Mode::EdgeDetection => "edge-detection",
            Mode::FaceMesh => "face-mesh",
            Mode::Avatar => "avatar",
            Mode::Hands => "hands",
            Mode::Beauty => "beauty",
            Mode::Cartoon => "cartoon",
        }
    }

    /// Model whose prediction the effect consumes, if any
    pub fn model(self) -> Option<ModelType> {
        match self {
            Mode::Blur => Some(ModelType::SelfieSegmentation),
            Mode::FaceDetection | Mode::Beauty => Some(ModelType::FaceDetection),
            Mode::PoseEstimation => Some(ModelType::Pose),
            Mode::FaceMesh | Mode::Avatar => Some(ModelType::FaceMesh),
            Mode::Hands => Some(ModelType::Hands),
            Mode::None | Mode::EdgeDetection | Mode::Cartoon => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Avatar overlay style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AvatarType {
    #[default]
    Cartoon,
    Robot,
    Mask,
    Neon,
}

impl AvatarType {
    pub const ALL: [AvatarType; 4] = [
        AvatarType::Cartoon,
        AvatarType::Robot,
        AvatarType::Mask,
        AvatarType::Neon,
    ];

    /// Parse a control-plane id. Unknown ids select [`AvatarType::Cartoon`].
    pub fn from_id(id: &str) -> Self {
        let id = id.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|avatar| avatar.id() == id)
            .unwrap_or_default()
    }

    pub fn id(self) -> &'static str {
        match self {
            AvatarType::Cartoon => "cartoon",
            AvatarType::Robot => "robot",
            AvatarType::Mask => "mask",
            AvatarType::Neon => "neon",
        }
    }
}

impl fmt::Display for AvatarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<String> for AvatarType {
    fn from(id: String) -> Self {
        Self::from_id(&id)
    }
}

impl From<AvatarType> for String {
    fn from(avatar: AvatarType) -> Self {
        avatar.id().to_string()
    }
}

/// The pair the pipeline reads at the start of each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectSelection {
    pub mode: Mode,
    pub avatar_type: AvatarType,
}

/// Shared, cloneable handle to the current [`EffectSelection`]
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    inner: Arc<RwLock<EffectSelection>>,
}

impl ControlHandle {
    pub fn new(selection: EffectSelection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(selection)),
        }
    }

    /// Select a mode by id; unknown ids fall back to `none`
    pub fn set_mode(&self, id: &str) -> Mode {
        let mode = Mode::from_id(id);
        self.inner.write().mode = mode;
        tracing::info!(mode = %mode, requested = id, "Effect mode changed");
        mode
    }

    /// Select an avatar style by id; unknown ids fall back to `cartoon`
    pub fn set_avatar_type(&self, id: &str) -> AvatarType {
        let avatar = AvatarType::from_id(id);
        self.inner.write().avatar_type = avatar;
        tracing::info!(avatar_type = %avatar, requested = id, "Avatar type changed");
        avatar
    }

    pub fn set(&self, selection: EffectSelection) {
        *self.inner.write() = selection;
    }

    /// Copy out the current selection
    pub fn snapshot(&self) -> EffectSelection {
        *self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_ids_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(Mode::from_id(mode.id()), mode);
        }
    }

    #[test]
    fn test_unknown_mode_is_none() {
        assert_eq!(Mode::from_id("sparkles"), Mode::None);
        assert_eq!(Mode::from_id(""), Mode::None);
    }

    #[test]
    fn test_mode_id_normalization() {
        assert_eq!(Mode::from_id(" Face-Mesh "), Mode::FaceMesh);
    }

    #[test]
    fn test_underscored_mode_ids_are_unknown() {
        assert_eq!(Mode::from_id("face_mesh"), Mode::None);
        assert_eq!(Mode::from_id("edge_detection"), Mode::None);
        let handle = ControlHandle::default();
        assert_eq!(handle.set_mode("pose_estimation"), Mode::None);
    }

    #[test]
    fn test_unknown_avatar_is_cartoon() {
        assert_eq!(AvatarType::from_id("dragon"), AvatarType::Cartoon);
        assert_eq!(AvatarType::from_id("NEON"), AvatarType::Neon);
    }

    #[test]
    fn test_mode_models() {
        assert_eq!(Mode::Blur.model(), Some(ModelType::SelfieSegmentation));
        assert_eq!(Mode::Beauty.model(), Some(ModelType::FaceDetection));
        assert_eq!(Mode::Avatar.model(), Some(ModelType::FaceMesh));
        assert_eq!(Mode::Cartoon.model(), None);
    }

    #[test]
    fn test_handle_shares_state() {
        let handle = ControlHandle::default();
        let reader = handle.clone();
        assert_eq!(handle.set_mode("avatar"), Mode::Avatar);
        handle.set_avatar_type("robot");
        assert_eq!(
            reader.snapshot(),
            EffectSelection {
                mode: Mode::Avatar,
                avatar_type: AvatarType::Robot,
            }
        );
    }

    #[test]
    fn test_avatar_type_serde_normalizes() {
        let avatar: AvatarType = serde_json::from_str("\"mystery\"").unwrap();
        assert_eq!(avatar, AvatarType::Cartoon);
        assert_eq!(serde_json::to_string(&AvatarType::Mask).unwrap(), "\"mask\"");
    }
}
