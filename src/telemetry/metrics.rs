//! Processing-time statistics
//!
//! Tracks how long each processed frame took, keeping cumulative totals and a
//! rolling window of recent samples for moving averages and percentiles.

use std::collections::VecDeque;
use std::time::Duration;

/// Number of recent samples kept for windowed statistics
pub const SAMPLE_WINDOW: usize = 100;

/// Default window for [`ProcessingStats::moving_average`]
pub const DEFAULT_MOVING_WINDOW: usize = 30;

/// Point-in-time summary of [`ProcessingStats`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Frames processed since creation or the last reset
    pub frame_count: u64,
    /// Average frame time in milliseconds over all frames
    pub avg_ms: f64,
    /// Moving average over the last 30 samples, in milliseconds
    pub moving_avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub last_ms: f64,
    /// 50th percentile (median) over the sample window
    pub p50_ms: f64,
    /// 95th percentile over the sample window
    pub p95_ms: f64,
    pub fps: f64,
    pub dropped_frames: u64,
    pub errors: u64,
}

/// Rolling frame-time statistics owned by one pipeline
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    frame_count: u64,
    total_time: Duration,
    min_time: Option<Duration>,
    max_time: Option<Duration>,
    last_time: Option<Duration>,
    samples: VecDeque<Duration>,
    dropped_frames: u64,
    errors: u64,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(SAMPLE_WINDOW),
            ..Default::default()
        }
    }

    /// Record one frame's processing time
    pub fn update(&mut self, sample: Duration) {
        self.frame_count += 1;
        self.total_time += sample;
        self.min_time = Some(self.min_time.map_or(sample, |m| m.min(sample)));
        self.max_time = Some(self.max_time.map_or(sample, |m| m.max(sample)));
        self.last_time = Some(sample);

        self.samples.push_back(sample);
        if self.samples.len() > SAMPLE_WINDOW {
            self.samples.pop_front();
        }
    }

    /// Clear all counters and samples
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// A frame that failed and was passed through unprocessed
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// A frame the caller chose not to process
    pub fn record_dropped(&mut self) {
        self.dropped_frames += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn min(&self) -> Option<Duration> {
        self.min_time
    }

    pub fn max(&self) -> Option<Duration> {
        self.max_time
    }

    pub fn last(&self) -> Option<Duration> {
        self.last_time
    }

    /// Samples in the rolling window, oldest first
    pub fn samples(&self) -> impl Iterator<Item = Duration> + '_ {
        self.samples.iter().copied()
    }

    /// Cumulative average over every recorded frame; zero when empty
    pub fn average(&self) -> Duration {
        if self.frame_count == 0 {
            return Duration::ZERO;
        }
        mean(self.total_time, self.frame_count)
    }

    /// Mean of the most recent `window` samples, or all of them if fewer
    pub fn moving_average(&self, window: usize) -> Duration {
        let take = window.min(self.samples.len());
        if take == 0 {
            return Duration::ZERO;
        }
        let sum: Duration = self.samples.iter().rev().take(take).sum();
        mean(sum, take as u64)
    }

    /// Frames per second implied by the cumulative average
    pub fn fps(&self) -> f64 {
        let avg = self.average().as_secs_f64();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let mut window: Vec<f64> = self.samples.iter().map(duration_ms).collect();
        window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        StatsSnapshot {
            frame_count: self.frame_count,
            avg_ms: duration_ms(&self.average()),
            moving_avg_ms: duration_ms(&self.moving_average(DEFAULT_MOVING_WINDOW)),
            min_ms: self.min_time.as_ref().map_or(0.0, duration_ms),
            max_ms: self.max_time.as_ref().map_or(0.0, duration_ms),
            last_ms: self.last_time.as_ref().map_or(0.0, duration_ms),
            p50_ms: percentile(&window, 0.50),
            p95_ms: percentile(&window, 0.95),
            fps: self.fps(),
            dropped_frames: self.dropped_frames,
            errors: self.errors,
        }
    }

    /// One-line summary for logs and the CLI
    pub fn fps_text(&self) -> String {
        format!(
            "{:.1} fps (avg {:.2} ms, last {:.2} ms)",
            self.fps(),
            duration_ms(&self.average()),
            self.last_time.as_ref().map_or(0.0, duration_ms)
        )
    }
}

fn mean(total: Duration, count: u64) -> Duration {
    Duration::from_nanos((total.as_nanos() / count as u128) as u64)
}

fn duration_ms(d: &Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Calculate percentile from sorted array
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p) as usize;
    sorted[idx]
}
