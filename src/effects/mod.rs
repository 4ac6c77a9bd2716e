//! Effects module
//!
//! One renderer per effect mode. Each renderer takes the frame as an RGB
//! image plus the prediction of the model its mode needs, and returns a new
//! image of the same size.

pub mod avatar;
pub mod background_blur;
pub mod beauty;
pub mod cartoon;
pub mod edge_art;
pub mod landmark_overlay;
pub mod topology;

use image::RgbImage;

use crate::config::ConfigManager;
use crate::control::{EffectSelection, Mode};
use crate::error::{EffectsError, Result};
use crate::ml::{Detection, LandmarkSet, ModelType, Prediction, SegmentationMask};

pub use avatar::AvatarParams;
pub use background_blur::BlurParams;
pub use beauty::BeautyParams;
pub use cartoon::CartoonParams;
pub use edge_art::EdgeParams;
pub use landmark_overlay::{MeshStyle, OverlayStyle};
pub use topology::Tessellation;

/// A fully parameterized effect, ready to render
#[derive(Debug, Clone)]
pub enum Effect {
    Passthrough,
    Blur(BlurParams),
    FaceDetection(OverlayStyle),
    Pose(OverlayStyle),
    EdgeDetection(EdgeParams),
    FaceMesh {
        style: MeshStyle,
        tessellation: Tessellation,
    },
    Avatar(AvatarParams),
    Hands { style: OverlayStyle, max_hands: usize },
    Beauty(BeautyParams),
    Cartoon(CartoonParams),
}

impl Effect {
    /// Build the effect for a control selection, taking colors and strengths
    /// from the configuration
    pub fn from_selection(selection: EffectSelection, config: &ConfigManager) -> Self {
        let style = OverlayStyle::from(&config.drawing);
        match selection.mode {
            Mode::None => Effect::Passthrough,
            Mode::Blur => Effect::Blur(BlurParams::default()),
            Mode::FaceDetection => Effect::FaceDetection(style),
            Mode::PoseEstimation => Effect::Pose(style),
            Mode::EdgeDetection => Effect::EdgeDetection(EdgeParams::default()),
            Mode::FaceMesh => Effect::FaceMesh {
                style: MeshStyle::default(),
                tessellation: Tessellation::empty(),
            },
            Mode::Avatar => Effect::Avatar(AvatarParams {
                avatar_type: selection.avatar_type,
                face_scale: config.avatar.face_scale,
            }),
            Mode::Hands => Effect::Hands {
                style,
                max_hands: config.model(ModelType::Hands).max_instances as usize,
            },
            Mode::Beauty => Effect::Beauty(BeautyParams::from(&config.beauty)),
            Mode::Cartoon => Effect::Cartoon(CartoonParams::default()),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Effect::Passthrough => Mode::None,
            Effect::Blur(_) => Mode::Blur,
            Effect::FaceDetection(_) => Mode::FaceDetection,
            Effect::Pose(_) => Mode::PoseEstimation,
            Effect::EdgeDetection(_) => Mode::EdgeDetection,
            Effect::FaceMesh { .. } => Mode::FaceMesh,
            Effect::Avatar(_) => Mode::Avatar,
            Effect::Hands { .. } => Mode::Hands,
            Effect::Beauty(_) => Mode::Beauty,
            Effect::Cartoon(_) => Mode::Cartoon,
        }
    }

    /// Model whose prediction `render` expects, if any
    pub fn model(&self) -> Option<ModelType> {
        self.mode().model()
    }

    /// Render one frame.
    ///
    /// `prediction` must come from [`Effect::model`]; model-free effects
    /// ignore it. `tick` counts processed frames and drives animation.
    pub fn render(
        &self,
        image: &RgbImage,
        prediction: Option<&Prediction>,
        tick: u64,
    ) -> Result<RgbImage> {
        match self {
            Effect::Passthrough => Ok(image.clone()),
            Effect::Blur(params) => {
                let mask = expect_mask(self.mode(), prediction)?;
                Ok(background_blur::render(image, mask, params))
            }
            Effect::FaceDetection(style) => {
                let detections = expect_detections(self.mode(), prediction)?;
                Ok(landmark_overlay::draw_detections(image, detections, style))
            }
            Effect::Pose(style) => {
                let sets = expect_landmarks(self.mode(), prediction)?;
                Ok(landmark_overlay::draw_pose(image, sets, style))
            }
            Effect::EdgeDetection(params) => Ok(edge_art::render(image, params)),
            Effect::FaceMesh { style, tessellation } => {
                let faces = expect_landmarks(self.mode(), prediction)?;
                Ok(landmark_overlay::draw_face_mesh(image, faces, style, tessellation))
            }
            Effect::Avatar(params) => {
                let faces = expect_landmarks(self.mode(), prediction)?;
                Ok(avatar::render(image, faces, params, tick))
            }
            Effect::Hands { style, max_hands } => {
                let hands = expect_landmarks(self.mode(), prediction)?;
                Ok(landmark_overlay::draw_hands(image, hands, style, *max_hands))
            }
            Effect::Beauty(params) => {
                let faces = expect_detections(self.mode(), prediction)?;
                Ok(beauty::render(image, faces, params))
            }
            Effect::Cartoon(params) => Ok(cartoon::render(image, params)),
        }
    }
}

fn mismatch(mode: Mode, wanted: &str, prediction: Option<&Prediction>) -> EffectsError {
    let got = prediction.map_or("nothing", Prediction::kind);
    EffectsError::invalid(format!(
        "effect '{}' needs a {} prediction, got {}",
        mode.id(),
        wanted,
        got
    ))
}

fn expect_mask(mode: Mode, prediction: Option<&Prediction>) -> Result<&SegmentationMask> {
    match prediction {
        Some(Prediction::Mask(mask)) => Ok(mask),
        other => Err(mismatch(mode, "mask", other)),
    }
}

fn expect_landmarks(mode: Mode, prediction: Option<&Prediction>) -> Result<&[LandmarkSet]> {
    match prediction {
        Some(Prediction::Landmarks { sets }) => Ok(sets),
        other => Err(mismatch(mode, "landmarks", other)),
    }
}

fn expect_detections(mode: Mode, prediction: Option<&Prediction>) -> Result<&[Detection]> {
    match prediction {
        Some(Prediction::Detections { detections }) => Ok(detections),
        other => Err(mismatch(mode, "detections", other)),
    }
}
