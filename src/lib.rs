//! Stream Effects - AI-driven visual effects for real-time video calls
//!
//! Frames go through an [`EffectsPipeline`](pipeline::EffectsPipeline): the
//! selected effect's model runs on the frame, a renderer draws the effect,
//! and the result keeps the input's timestamp. Models are reached only
//! through the [`ml::Model`] contract, so the pipeline runs the same with
//! ONNX models, recorded predictions, or none at all.

pub mod config;
pub mod control;
pub mod detection;
pub mod effects;
pub mod error;
pub mod frame;
pub mod imaging;
pub mod ml;
pub mod pipeline;
pub mod telemetry;
pub mod track;

pub use config::ConfigManager;
pub use control::{AvatarType, ControlHandle, EffectSelection, Mode};
pub use error::{EffectsError, Result};
pub use frame::{Frame, PixelFormat, TimeBase};
pub use pipeline::EffectsPipeline;
pub use track::EffectTrack;
