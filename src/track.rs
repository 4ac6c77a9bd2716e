//! Async frame track
//!
//! Pulls frames from a channel and hands back processed ones, the way a
//! media track is polled by its sender.

use tokio::sync::mpsc;

use crate::control::ControlHandle;
use crate::frame::Frame;
use crate::pipeline::EffectsPipeline;

/// A video track that runs every incoming frame through a pipeline
pub struct EffectTrack {
    source: mpsc::Receiver<Frame>,
    pipeline: EffectsPipeline,
}

impl EffectTrack {
    pub fn new(source: mpsc::Receiver<Frame>, pipeline: EffectsPipeline) -> Self {
        Self { source, pipeline }
    }

    /// Wait for the next source frame and return it processed.
    ///
    /// Returns `None` once the source is closed and drained.
    pub async fn recv(&mut self) -> Option<Frame> {
        let frame = self.source.recv().await?;
        Some(self.pipeline.process(frame))
    }

    pub fn control(&self) -> ControlHandle {
        self.pipeline.control()
    }

    pub fn pipeline(&self) -> &EffectsPipeline {
        &self.pipeline
    }

    /// Stop accepting frames and give back the pipeline
    pub fn into_pipeline(mut self) -> EffectsPipeline {
        self.source.close();
        self.pipeline
    }
}
