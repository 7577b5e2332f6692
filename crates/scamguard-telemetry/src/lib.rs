//! Scamguard Telemetry
//!
//! Everything the pipeline reports about itself without waiting on it:
//! - An append-only JSON-lines action log written by a background thread
//! - Moderation counters exported through the `metrics` facade
//! - Fire-and-forget debug traces posted to a moderator channel

pub mod action_log;
pub mod debug_trace;
pub mod metrics;

pub use crate::action_log::{ActionEvent, ActionLog, ActionRecord};
pub use crate::debug_trace::{DebugTracer, TraceReport};
pub use crate::metrics::{ClassificationSource, MetricsSnapshot, ModerationMetrics};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action_log::{ActionEvent, ActionLog};
    pub use crate::debug_trace::DebugTracer;
    pub use crate::metrics::ModerationMetrics;
}
