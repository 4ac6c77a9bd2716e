//! Telemetry and logging infrastructure

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig, LogGuard};
pub use metrics::{ProcessingStats, StatsSnapshot};
