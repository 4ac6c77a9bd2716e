//! Frame pipeline
//!
//! The per-frame entry point: read the current selection, run the effect's
//! model, render, and emit a frame with the input's timing.

use std::time::Instant;

use crate::config::ConfigManager;
use crate::control::{ControlHandle, EffectSelection, Mode};
use crate::effects::{cartoon, Effect, Tessellation};
use crate::error::{EffectsError, Result};
use crate::frame::Frame;
use crate::ml::InferenceEngine;
use crate::telemetry::ProcessingStats;

/// Applies the selected effect to frames, one at a time
pub struct EffectsPipeline {
    config: ConfigManager,
    engine: InferenceEngine,
    control: ControlHandle,
    stats: ProcessingStats,
    /// Frames rendered so far; drives animated effects
    tick: u64,
    cartoon_seed: u64,
    tessellation: Tessellation,
}

impl EffectsPipeline {
    pub fn new(config: ConfigManager, engine: InferenceEngine, control: ControlHandle) -> Self {
        Self {
            config,
            engine,
            control,
            stats: ProcessingStats::new(),
            tick: 0,
            cartoon_seed: cartoon::DEFAULT_SEED,
            tessellation: Tessellation::empty(),
        }
    }

    /// Seed for the cartoon effect's color clustering
    pub fn set_cartoon_seed(&mut self, seed: u64) {
        self.cartoon_seed = seed;
    }

    /// Edge table the face-mesh effect draws under its contours
    pub fn set_tessellation(&mut self, tessellation: Tessellation) {
        self.tessellation = tessellation;
    }

    /// Handle for the control plane; clones share the same selection
    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut ProcessingStats {
        &mut self.stats
    }

    /// Process a frame, returning the input unchanged if anything fails.
    ///
    /// Failures are logged and counted in telemetry.
    pub fn process(&mut self, frame: Frame) -> Frame {
        match self.step(frame) {
            Ok(out) => out,
            Err((frame, e)) => {
                tracing::warn!(error = %e, pts = ?frame.pts, "Effect failed, passing frame through");
                self.stats.record_error();
                frame
            }
        }
    }

    /// Process a frame, returning inference and rendering errors to the caller
    pub fn try_process(&mut self, frame: Frame) -> Result<Frame> {
        self.step(frame).map_err(|(_, e)| e)
    }

    fn step(&mut self, frame: Frame) -> std::result::Result<Frame, (Frame, EffectsError)> {
        let selection = self.control.snapshot();
        if selection.mode == Mode::None {
            return Ok(frame);
        }

        let start = Instant::now();
        let result = self.apply(selection, &frame);
        self.stats.update(start.elapsed());
        self.tick = self.tick.wrapping_add(1);
        self.log_progress(selection);

        match result {
            Ok(Some(out)) => Ok(out),
            Ok(None) => Ok(frame),
            Err(e) => Err((frame, e)),
        }
    }

    /// `Ok(None)` means the effect's model is not available and the input
    /// should be emitted as is
    fn apply(&mut self, selection: EffectSelection, frame: &Frame) -> Result<Option<Frame>> {
        let mut effect = Effect::from_selection(selection, &self.config);
        match &mut effect {
            Effect::Cartoon(params) => params.seed = self.cartoon_seed,
            Effect::FaceMesh { tessellation, .. } => tessellation.clone_from(&self.tessellation),
            _ => {}
        }
        let image = frame.to_rgb_image()?;

        let prediction = match effect.model() {
            Some(model_type) => {
                if !self.config.model(model_type).enabled {
                    return Ok(None);
                }
                match self.engine.infer(model_type, &image)? {
                    Some(prediction) => Some(prediction),
                    None => return Ok(None),
                }
            }
            None => None,
        };

        let rendered = effect.render(&image, prediction.as_ref(), self.tick)?;
        frame.derive(rendered).map(Some)
    }

    fn log_progress(&self, selection: EffectSelection) {
        let processing = &self.config.processing;
        if !processing.enable_performance_logging || processing.performance_log_interval == 0 {
            return;
        }
        let frames = self.stats.frame_count();
        if frames % processing.performance_log_interval != 0 {
            return;
        }

        let snapshot = self.stats.snapshot();
        tracing::info!(
            mode = %selection.mode,
            frames,
            avg_ms = snapshot.avg_ms,
            moving_avg_ms = snapshot.moving_avg_ms,
            p95_ms = snapshot.p95_ms,
            fps = snapshot.fps,
            errors = snapshot.errors,
            "{}",
            self.stats.fps_text()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{PixelFormat, TimeBase};
    use crate::ml::replay::ReplayModel;
    use crate::ml::{Landmark, Model, ModelType, Prediction, SegmentationMask};

    fn frame() -> Frame {
        let data: Vec<u8> = (0..8 * 8 * 3).map(|i| (i * 7 % 256) as u8).collect();
        Frame::new(data, 8, 8, PixelFormat::Bgr24)
            .unwrap()
            .with_timing(Some(4200), TimeBase { num: 1, den: 30 })
    }

    fn pipeline_with(models: Vec<ReplayModel>) -> EffectsPipeline {
        let config = ConfigManager::default();
        let mut engine = InferenceEngine::empty();
        for model in models {
            let model_config = config.model(model.model_type()).clone();
            engine.insert(Box::new(model), model_config);
        }
        EffectsPipeline::new(config, engine, ControlHandle::default())
    }

    #[test]
    fn test_none_mode_is_passthrough_without_telemetry() {
        let mut pipeline = pipeline_with(Vec::new());
        let input = frame();
        let ptr = input.data.as_ptr();

        let out = pipeline.process(input);
        assert_eq!(out.data.as_ptr(), ptr);
        assert_eq!(pipeline.stats().frame_count(), 0);
    }

    #[test]
    fn test_missing_model_returns_frame_but_is_timed() {
        let mut pipeline = pipeline_with(Vec::new());
        pipeline.control().set_mode("blur");
        let input = frame();

        let out = pipeline.process(input.clone());
        assert_eq!(out, input);
        assert_eq!(pipeline.stats().frame_count(), 1);
        assert_eq!(pipeline.stats().errors(), 0);
    }

    #[test]
    fn test_output_keeps_timing_and_format() {
        let mask = SegmentationMask::new(1, 1, vec![0.0]).unwrap();
        let model = ReplayModel::new(ModelType::SelfieSegmentation, vec![Prediction::Mask(mask)]);
        let mut pipeline = pipeline_with(vec![model]);
        pipeline.control().set_mode("blur");

        let input = frame();
        let out = pipeline.try_process(input.clone()).unwrap();
        assert_eq!(out.pts, Some(4200));
        assert_eq!(out.time_base, input.time_base);
        assert_eq!(out.format, PixelFormat::Bgr24);
        assert_ne!(out.data, input.data);
    }

    #[test]
    fn test_wrong_prediction_is_skipped_by_process() {
        // A landmark model wired into the segmentation slot
        let model = ReplayModel::new(
            ModelType::SelfieSegmentation,
            vec![Prediction::Landmarks {
                sets: vec![vec![Landmark::new(0.5, 0.5)]],
            }],
        );
        let mut pipeline = pipeline_with(vec![model]);
        pipeline.control().set_mode("blur");

        let input = frame();
        assert!(pipeline.try_process(input.clone()).is_err());
        let out = pipeline.process(input.clone());
        assert_eq!(out, input);
        assert_eq!(pipeline.stats().errors(), 1);
        assert_eq!(pipeline.stats().frame_count(), 2);
    }

    #[test]
    fn test_mode_change_applies_on_next_frame() {
        let mut pipeline = pipeline_with(Vec::new());
        let control = pipeline.control();

        pipeline.process(frame());
        control.set_mode("edge-detection");
        let input = frame();
        let out = pipeline.process(input.clone());
        assert_ne!(out.data, input.data);
        assert_eq!(pipeline.stats().frame_count(), 1);
    }

    #[test]
    fn test_tessellation_reaches_face_mesh() {
        use crate::effects::topology::{face_contours, irises, FACE_MESH_WITH_IRIS_COUNT};

        let used: Vec<usize> = face_contours()
            .into_iter()
            .chain(irises())
            .flat_map(|(a, b)| [a, b])
            .collect();
        let mut free = (0..468).filter(|i| !used.contains(i));
        let (a, b) = (free.next().unwrap(), free.next().unwrap());

        let mut face = vec![Landmark::new(0.0, 0.0); FACE_MESH_WITH_IRIS_COUNT];
        face[a] = Landmark::new(0.1, 0.5);
        face[b] = Landmark::new(0.9, 0.5);
        let prediction = Prediction::Landmarks { sets: vec![face] };
        let input = Frame::new(vec![0; 40 * 40 * 3], 40, 40, PixelFormat::Bgr24).unwrap();

        let mut plain = pipeline_with(vec![ReplayModel::new(
            ModelType::FaceMesh,
            vec![prediction.clone()],
        )]);
        let mut meshed = pipeline_with(vec![ReplayModel::new(ModelType::FaceMesh, vec![prediction])]);
        meshed.set_tessellation(Tessellation::from_edges([(a, b)]).unwrap());
        plain.control().set_mode("face-mesh");
        meshed.control().set_mode("face-mesh");

        let without = plain.try_process(input.clone()).unwrap().to_rgb_image().unwrap();
        let with = meshed.try_process(input).unwrap().to_rgb_image().unwrap();
        assert_eq!(with.get_pixel(20, 20).0, [192, 192, 192]);
        assert_eq!(without.get_pixel(20, 20).0, [0, 0, 0]);
    }
}
