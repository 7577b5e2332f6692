//! Core types for scamguard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The author of a chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    /// Platform user id
    pub id: String,

    /// Display name
    pub name: String,

    /// Whether the author is an automated account
    #[serde(default)]
    pub bot: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl Author {
    /// Account age in whole days at `now`, never negative
    pub fn age_days_at(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }

    /// Account age in whole days
    pub fn age_days(&self) -> i64 {
        self.age_days_at(Utc::now())
    }
}

/// An inbound chat message. The pipeline never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message id
    pub id: String,

    /// Channel the message was posted in
    pub channel_id: String,

    /// Guild/server id, `None` for direct messages
    pub guild_id: Option<String>,

    /// Message author
    pub author: Author,

    /// Raw text content
    pub content: String,
}

impl Message {
    /// Account age of the author in days
    pub fn author_age_days(&self) -> i64 {
        self.author.age_days()
    }

    /// Link pointing at the original message
    pub fn jump_link(&self) -> String {
        format!(
            "https://discord.com/channels/{}/{}/{}",
            self.guild_id.as_deref().unwrap_or("@me"),
            self.channel_id,
            self.id
        )
    }
}

/// Label of a content sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Scam,
    NotScam,
}

impl Label {
    /// Label for a boolean scam verdict
    pub fn from_scam(is_scam: bool) -> Self {
        if is_scam {
            Self::Scam
        } else {
            Self::NotScam
        }
    }

    /// The other label
    pub fn opposite(self) -> Self {
        match self {
            Self::Scam => Self::NotScam,
            Self::NotScam => Self::Scam,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scam => "scam",
            Self::NotScam => "not_scam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one message. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the message is considered malicious
    pub is_scam: bool,

    /// Confidence score (0.0-1.0)
    pub confidence: f64,

    /// Ordered, human readable reasons
    pub reasons: Vec<String>,

    /// Tags (unique, insertion ordered)
    pub tags: Vec<String>,

    /// Whether a hard-block pattern matched
    pub hard_block: bool,
}

impl Decision {
    /// Create a decision, clamping confidence and removing duplicate tags
    pub fn new(
        is_scam: bool,
        confidence: f64,
        reasons: Vec<String>,
        tags: Vec<String>,
        hard_block: bool,
    ) -> Self {
        let mut unique_tags: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique_tags.contains(&tag) {
                unique_tags.push(tag);
            }
        }

        Self {
            is_scam,
            confidence: clamp_confidence(confidence),
            reasons,
            tags: unique_tags,
            hard_block,
        }
    }

    /// Label predicted by this decision
    pub fn predicted_label(&self) -> Label {
        Label::from_scam(self.is_scam)
    }

    /// Whether the decision carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Clamp a confidence into [0, 1]; NaN becomes 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Context recorded alongside a labeled example
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_age_days: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl ExampleMeta {
    /// Message id, if present and non-empty
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A labeled content sample used as few-shot context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub content: String,

    pub label: Label,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default)]
    pub meta: ExampleMeta,

    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl LabeledExample {
    /// Create an example with default weight and no metadata
    pub fn new(content: impl Into<String>, label: Label) -> Self {
        Self {
            content: content.into(),
            label,
            reason: None,
            meta: ExampleMeta::default(),
            weight: default_weight(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_meta(mut self, meta: ExampleMeta) -> Self {
        self.meta = meta;
        self
    }
}

fn default_weight() -> f64 {
    1.0
}

/// Output contract of every classifier backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResponse {
    /// Completion text as returned by the backend
    pub raw: String,

    /// Completion parsed as a JSON object, when possible
    pub json: Option<serde_json::Value>,
}

impl ProviderResponse {
    /// Empty response, used for transport failures and timeouts
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a response from completion text, attempting to parse it
    pub fn from_completion(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let json = parse_json_object(&raw);
        Self { raw, json }
    }
}

/// Parse completion text as a JSON object.
///
/// The whole text is tried first; failing that, the outermost `{ ... }` span,
/// which tolerates code fences and leading commentary. Non-object values
/// are rejected.
pub fn parse_json_object(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(value @ serde_json::Value::Object(_)) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str(&trimmed[start..=end]) {
        Ok(value @ serde_json::Value::Object(_)) => Some(value),
        _ => None,
    }
}
