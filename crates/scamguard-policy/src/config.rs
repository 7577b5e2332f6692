//! Moderation configuration
//!
//! One document (JSON or YAML) loaded at startup and read-only afterwards,
//! plus the channel routing that comes from the environment.

use scamguard_core::{Error, Result};
use scamguard_memory::FewShotConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_PATH_VAR: &str = "SAFETY_CONFIG_PATH";

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationConfig {
    /// Classifier backend name
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier passed to the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Gate for destructive actions
    #[serde(default)]
    pub production_ready: bool,

    /// Patterns that qualify a message for classification
    #[serde(default)]
    pub trigger_patterns: Vec<String>,

    /// Patterns whose match alone justifies a scam verdict
    #[serde(default)]
    pub hard_block_regexes: Vec<String>,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub moderation: ModerationPolicy,

    #[serde(default)]
    pub few_shot: FewShotConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upper bound on one classifier call
    #[serde(default = "default_classifier_timeout")]
    pub classifier_timeout_sec: u64,

    /// Directory holding the seed and learned example files
    #[serde(default = "default_examples_dir")]
    pub examples_dir: PathBuf,

    #[serde(default = "default_action_log_path")]
    pub action_log_path: PathBuf,

    #[serde(default)]
    pub message_cache: MessageCacheConfig,

    /// Channel routing, filled from the environment
    #[serde(skip)]
    pub channels: Channels,
}

impl ModerationConfig {
    /// Pick the config file: explicit path, `SAFETY_CONFIG_PATH`,
    /// `config.yaml`, then `config.json`
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = std::env::var_os(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        let yaml = PathBuf::from("config.yaml");
        if yaml.exists() {
            return yaml;
        }
        PathBuf::from("config.json")
    }

    /// Load the config file and apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(explicit);
        let mut config = Self::from_file(&path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a config file without touching the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Parse a JSON or YAML document
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would silently disable a stage
    pub fn validate(&self) -> Result<()> {
        if self.classifier_timeout_sec == 0 {
            return Err(Error::config("classifierTimeoutSec must be at least 1"));
        }
        Ok(())
    }

    /// Apply `LLM_PROVIDER` and the channel variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("LLM_PROVIDER").filter(|p| !p.trim().is_empty()) {
            self.provider = provider.trim().to_string();
        }
        self.channels = Channels::from_lookup(lookup);
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier_timeout_sec)
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            production_ready: false,
            trigger_patterns: Vec::new(),
            hard_block_regexes: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            moderation: ModerationPolicy::default(),
            few_shot: FewShotConfig::default(),
            logging: LoggingConfig::default(),
            classifier_timeout_sec: default_classifier_timeout(),
            examples_dir: default_examples_dir(),
            action_log_path: default_action_log_path(),
            message_cache: MessageCacheConfig::default(),
            channels: Channels::default(),
        }
    }
}

/// Classifier throughput limits. Zero means unlimited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    #[serde(default)]
    pub max_calls_per_minute: i64,

    #[serde(default)]
    pub per_channel_cooldown_sec: u64,
}

/// Thresholds and action toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationPolicy {
    #[serde(default = "default_min_delete")]
    pub min_confidence_to_delete: f64,

    #[serde(default = "default_min_flag")]
    pub min_confidence_to_flag: f64,

    /// Hard-block matches skip the classifier and delete outright
    #[serde(default)]
    pub delete_if_hard_block_regex: bool,

    #[serde(default)]
    pub actions: ActionToggles,
}

impl Default for ModerationPolicy {
    fn default() -> Self {
        Self {
            min_confidence_to_delete: default_min_delete(),
            min_confidence_to_flag: default_min_flag(),
            delete_if_hard_block_regex: false,
            actions: ActionToggles::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionToggles {
    #[serde(default)]
    pub delete_message: bool,

    #[serde(default)]
    pub dm_user_on_delete: bool,

    #[serde(default = "default_true")]
    pub post_mod_alert: bool,
}

impl Default for ActionToggles {
    fn default() -> Self {
        Self {
            delete_message: false,
            dm_user_on_delete: false,
            post_mod_alert: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    #[serde(default = "default_cache_ttl")]
    pub ttl_sec: u64,
}

impl Default for MessageCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_sec: default_cache_ttl(),
        }
    }
}

/// Where alerts and traces go, and which channels are never scanned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channels {
    pub mod_channel_id: Option<String>,
    pub debug_channel_id: Option<String>,
    pub whitelist_channels: Vec<String>,
    pub whitelist_categories: Vec<String>,
}

impl Channels {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let single = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let list = |name: &str| {
            lookup(name)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default()
        };

        Self {
            mod_channel_id: single("MOD_CHANNEL_ID"),
            debug_channel_id: single("DEBUG_CHANNEL_ID"),
            whitelist_channels: list("WHITELIST_CHANNELS"),
            whitelist_categories: list("WHITELIST_CATEGORIES"),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_classifier_timeout() -> u64 {
    20
}

fn default_examples_dir() -> PathBuf {
    PathBuf::from("examples_store")
}

fn default_action_log_path() -> PathBuf {
    PathBuf::from("logs/actions.log")
}

fn default_min_delete() -> f64 {
    0.9
}

fn default_min_flag() -> f64 {
    0.6
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_capacity() -> usize {
    10_000
}

fn default_cache_ttl() -> u64 {
    86_400
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_json_document() {
        let config = ModerationConfig::parse(
            r#"{
                "provider": "groq",
                "model": "llama-3.1-8b-instant",
                "productionReady": true,
                "triggerPatterns": ["(?i)nitro"],
                "hardBlockRegexes": ["(?i)wallet\\s+seed"],
                "rateLimit": {"maxCallsPerMinute": 30, "perChannelCooldownSec": 10},
                "moderation": {
                    "minConfidenceToDelete": 0.95,
                    "minConfidenceToFlag": 0.5,
                    "deleteIfHardBlockRegex": true,
                    "actions": {"deleteMessage": true, "dmUserOnDelete": true, "postModAlert": true}
                },
                "fewShot": {"maxSeedExamples": 5, "maxLearnedExamples": 5, "maxExamplesPerPrompt": 8, "prioritizeHardNegatives": true},
                "logging": {"level": "debug"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.provider, "groq");
        assert!(config.production_ready);
        assert_eq!(config.hard_block_regexes, vec!["(?i)wallet\\s+seed"]);
        assert_eq!(config.rate_limit.max_calls_per_minute, 30);
        assert!(config.moderation.actions.dm_user_on_delete);
        assert!(config.few_shot.prioritize_hard_negatives);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.classifier_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_missing_sections_default() {
        let config = ModerationConfig::parse("provider: anthropic\nmodel: claude\n").unwrap();
        assert_eq!(config.rate_limit.max_calls_per_minute, 0);
        assert_eq!(config.rate_limit.per_channel_cooldown_sec, 0);
        assert!(!config.production_ready);
        assert_eq!(config.message_cache.capacity, 10_000);
        assert_eq!(config.examples_dir, PathBuf::from("examples_store"));
    }

    #[test]
    fn test_unparseable_document_is_config_error() {
        let err = ModerationConfig::parse("rateLimit: [1, 2").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let missing = ModerationConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(missing.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_zero_classifier_timeout_rejected() {
        let err = ModerationConfig::parse("classifierTimeoutSec: 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("classifierTimeoutSec"));

        let config = ModerationConfig::parse("classifierTimeoutSec: 5\n").unwrap();
        assert_eq!(config.classifier_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("LLM_PROVIDER", "mistral"),
            ("MOD_CHANNEL_ID", " 111 "),
            ("DEBUG_CHANNEL_ID", ""),
            ("WHITELIST_CHANNELS", "1, 2,,3 "),
        ]);

        let mut config = ModerationConfig::default();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.provider, "mistral");
        assert_eq!(config.channels.mod_channel_id.as_deref(), Some("111"));
        assert_eq!(config.channels.debug_channel_id, None);
        assert_eq!(config.channels.whitelist_channels, vec!["1", "2", "3"]);
        assert!(config.channels.whitelist_categories.is_empty());
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = ModerationConfig::resolve_path(Some(Path::new("custom.yaml")));
        assert_eq!(path, PathBuf::from("custom.yaml"));
    }
}
