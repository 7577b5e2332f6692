//! Scamguard Memory
//!
//! The durable few-shot corpus behind every classification:
//! - Seed and learned partitions stored as JSON lines
//! - Prompt-time selection with hard-negative prioritisation
//! - Weighted adoption of automated and moderator-confirmed examples
//! - Correction rewrites keeping at most one example per message id

pub mod store;

pub use store::{assign_weight, select_examples, AdoptionInput, ExampleStore, FewShotConfig, StoreStats};
