//! Scamguard Classifiers
//!
//! Everything between a chat message and a classifier verdict:
//! - Prompt building from the message and few-shot examples
//! - Backend adapters for OpenAI-compatible, Anthropic, Mistral and
//!   Hugging Face inference endpoints
//! - A gateway that bounds each call with a timeout and never lets a
//!   transport failure escape

pub mod classifier;
pub mod gateway;
pub mod prompt;
pub mod providers;

pub use classifier::{ClassifierBackend, ProviderKind};
pub use gateway::{ClassifierGateway, GatewayResponse, DEFAULT_TIMEOUT};
pub use prompt::{Prompt, PromptBuilder};
pub use providers::{backend_by_name, ProviderCredentials};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::ClassifierBackend;
    pub use crate::gateway::ClassifierGateway;
    pub use crate::prompt::PromptBuilder;
}
