//! Scamguard Policy
//!
//! Everything that decides what happens to a message:
//! - Configuration and channel routing
//! - Admission (whitelists, trigger and hard-block patterns)
//! - Per-channel cooldown and a global token bucket
//! - Decisions from classifier output or the fallback heuristic
//! - Moderation actions, alerts, and moderator corrections

pub mod action;
pub mod admission;
pub mod alert;
pub mod cache;
pub mod config;
pub mod correction;
pub mod decision;
pub mod executor;
pub mod rate_limit;

pub use action::ActionPlan;
pub use admission::{Admission, AdmissionFilter};
pub use cache::MessageCache;
pub use config::{Channels, ModerationConfig, ModerationPolicy, RateLimitConfig};
pub use correction::CorrectionHandler;
pub use decision::DecisionEngine;
pub use executor::{ActionExecutor, ActionOutcome};
pub use rate_limit::{RateDecision, RateLimiter, TokenBucket};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::admission::{Admission, AdmissionFilter};
    pub use crate::config::ModerationConfig;
    pub use crate::decision::DecisionEngine;
    pub use crate::executor::ActionExecutor;
    pub use crate::rate_limit::RateLimiter;
}
