//! Decision engine
//!
//! Turns admission and classifier output into a [`Decision`]:
//! 1. Hard-blocked with `deleteIfHardBlockRegex`: fixed verdict, no classifier.
//! 2. Classifier JSON carrying a boolean `is_scam`: adopted after normalisation.
//! 3. Anything else: keyword heuristic over messages with links.

use aho_corasick::AhoCorasick;
use scamguard_core::{Decision, Error, ProviderResponse, Result};
use scamguard_telemetry::ClassificationSource;
use serde_json::Value;

const FALLBACK_KEYWORDS: [&str; 4] = ["nitro", "airdrop", "wallet", "seed"];
const MAX_LIST_ENTRIES: usize = 6;
const HARD_BLOCK_CONFIDENCE: f64 = 0.99;
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Converts classification results into decisions
pub struct DecisionEngine {
    keywords: AhoCorasick,
    delete_if_hard_block: bool,
}

impl DecisionEngine {
    pub fn new(delete_if_hard_block: bool) -> Result<Self> {
        let keywords = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(FALLBACK_KEYWORDS)
            .map_err(|e| Error::internal(format!("Failed to build keyword matcher: {}", e)))?;

        Ok(Self {
            keywords,
            delete_if_hard_block,
        })
    }

    /// Deterministic verdict for hard-blocked messages, when configured
    pub fn fast_path(&self, hard_blocked: bool) -> Option<Decision> {
        (hard_blocked && self.delete_if_hard_block).then(Self::hard_block_decision)
    }

    pub fn hard_block_decision() -> Decision {
        Decision::new(
            true,
            HARD_BLOCK_CONFIDENCE,
            vec!["Matched hard-block pattern".to_string()],
            vec!["hard_block".to_string()],
            true,
        )
    }

    /// Decide from a classifier response, falling back when it has no verdict
    pub fn decide(
        &self,
        response: &ProviderResponse,
        content: &str,
        links: &[String],
        hard_blocked: bool,
    ) -> (Decision, ClassificationSource) {
        match response.json.as_ref().and_then(|j| parse_verdict(j, hard_blocked)) {
            Some(decision) => (decision, ClassificationSource::Classifier),
            None => (
                self.fallback(content, links, hard_blocked),
                ClassificationSource::Fallback,
            ),
        }
    }

    /// Keyword heuristic used when the classifier gave nothing usable
    pub fn fallback(&self, content: &str, links: &[String], hard_blocked: bool) -> Decision {
        let is_scam = hard_blocked || (!links.is_empty() && self.keywords.is_match(content));
        Decision::new(
            is_scam,
            if is_scam { 0.7 } else { 0.3 },
            vec!["Heuristic fallback".to_string()],
            vec!["fallback".to_string()],
            hard_blocked,
        )
    }
}

/// Normalise a classifier JSON object. `None` unless `is_scam` is a boolean.
fn parse_verdict(json: &Value, hard_blocked: bool) -> Option<Decision> {
    let is_scam = json.get("is_scam")?.as_bool()?;
    let confidence = json
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_CONFIDENCE);

    Some(Decision::new(
        is_scam,
        confidence,
        string_list(json.get("reasons")),
        string_list(json.get("tags")),
        hard_blocked,
    ))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .take(MAX_LIST_ENTRIES)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
