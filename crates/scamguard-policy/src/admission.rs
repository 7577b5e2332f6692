//! Admission filter
//!
//! Decides whether a message is worth classifying at all. Evaluation order:
//! ignored senders and empty content, whitelisted channel or category,
//! hard-block patterns, then trigger patterns.

use regex::RegexSet;
use scamguard_core::{Error, Message, Result};
use std::collections::HashSet;

use crate::config::{Channels, ModerationConfig};

/// Result of admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Bot author, direct message, or blank content
    Ignored,

    /// Channel or its category is whitelisted
    Whitelisted,

    /// No pattern matched
    NotTriggered,

    /// Eligible for classification
    Triggered { hard_blocked: bool },
}

impl Admission {
    /// Label used for the `outcome` metric
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Whitelisted => "whitelisted",
            Self::NotTriggered => "not_triggered",
            Self::Triggered { .. } => "triggered",
        }
    }
}

/// Compiled admission rules
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    triggers: RegexSet,
    hard_blocks: RegexSet,
    whitelist_channels: HashSet<String>,
    whitelist_categories: HashSet<String>,
}

impl AdmissionFilter {
    /// Compile the pattern lists. Any invalid pattern is an error.
    pub fn new(triggers: &[String], hard_blocks: &[String], channels: &Channels) -> Result<Self> {
        Ok(Self {
            triggers: compile("trigger", triggers)?,
            hard_blocks: compile("hard-block", hard_blocks)?,
            whitelist_channels: channels.whitelist_channels.iter().cloned().collect(),
            whitelist_categories: channels.whitelist_categories.iter().cloned().collect(),
        })
    }

    pub fn from_config(config: &ModerationConfig) -> Result<Self> {
        Self::new(
            &config.trigger_patterns,
            &config.hard_block_regexes,
            &config.channels,
        )
    }

    /// Whether evaluation needs the channel's parent category
    pub fn needs_parent(&self) -> bool {
        !self.whitelist_categories.is_empty()
    }

    pub fn is_hard_blocked(&self, content: &str) -> bool {
        self.hard_blocks.is_match(content)
    }

    pub fn is_triggered(&self, content: &str) -> bool {
        self.triggers.is_match(content)
    }

    /// Evaluate a message. `parent_id` is the channel's category, if known.
    pub fn evaluate(&self, message: &Message, parent_id: Option<&str>) -> Admission {
        if message.author.bot || message.guild_id.is_none() || message.content.trim().is_empty() {
            return Admission::Ignored;
        }

        if self.whitelist_channels.contains(&message.channel_id)
            || parent_id.is_some_and(|p| self.whitelist_categories.contains(p))
        {
            return Admission::Whitelisted;
        }

        let hard_blocked = self.is_hard_blocked(&message.content);
        if hard_blocked || self.is_triggered(&message.content) {
            Admission::Triggered { hard_blocked }
        } else {
            Admission::NotTriggered
        }
    }
}

fn compile(kind: &str, patterns: &[String]) -> Result<RegexSet> {
    RegexSet::new(patterns)
        .map_err(|e| Error::config(format!("Invalid {} pattern: {}", kind, e)))
}
