//! Scamguard Core
//!
//! Core types, traits, and utilities shared across scamguard components.
//!
//! This crate provides:
//! - The message, decision, and labeled-example data model
//! - The uniform classifier response contract
//! - The chat platform capability trait and rich alert model
//! - Error types and result handling

pub mod error;
pub mod interaction;
pub mod platform;
pub mod types;

pub use error::{Error, Result};
pub use interaction::{InteractionAction, InteractionEvent, InteractionId, InteractionReply};
pub use platform::{truncate, ChatPlatform, Control, ControlStyle, RichField, RichMessage};
pub use types::{
    clamp_confidence, parse_json_object, Author, Decision, ExampleMeta, Label, LabeledExample,
    Message, ProviderResponse,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::platform::ChatPlatform;
    pub use crate::types::{Decision, Label, LabeledExample, Message, ProviderResponse};
}
