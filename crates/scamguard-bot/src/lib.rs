//! Scamguard Bot
//!
//! The moderation pipeline assembled from the component crates, plus a
//! dry-run chat platform for running it without a live connection.

pub mod dry_run;
pub mod pipeline;

pub use dry_run::{DryRunPlatform, PlatformCall};
pub use pipeline::{Moderated, ModerationPipeline, ProcessOutcome};
