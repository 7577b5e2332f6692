//! Dry-run chat platform
//!
//! Stands in for a real chat connection when running the pipeline from the
//! command line. Nothing leaves the process: every side effect is logged and
//! recorded so it can be inspected afterwards.

use async_trait::async_trait;
use parking_lot::Mutex;
use scamguard_core::{ChatPlatform, Message, Result, RichMessage};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// A side effect the pipeline asked for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum PlatformCall {
    Delete {
        channel_id: String,
        message_id: String,
    },
    DirectMessage {
        user_id: String,
        content: String,
    },
    RichMessage {
        channel_id: String,
        message: RichMessage,
    },
}

/// Recording platform with no network behind it
#[derive(Default)]
pub struct DryRunPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    messages: Mutex<HashMap<String, Message>>,
    parents: HashMap<String, String>,
    moderators: HashSet<String>,
}

impl DryRunPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a user message-management rights everywhere
    pub fn with_moderator(mut self, user_id: impl Into<String>) -> Self {
        self.moderators.insert(user_id.into());
        self
    }

    /// Place a channel under a category
    pub fn with_parent(mut self, channel_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        self.parents.insert(channel_id.into(), parent_id.into());
        self
    }

    /// Make a message fetchable, as if it were still live
    pub fn post(&self, message: Message) {
        self.messages.lock().insert(message.id.clone(), message);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    fn push(&self, call: PlatformCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ChatPlatform for DryRunPlatform {
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        info!(channel = %channel_id, message_id = %message_id, "[dry-run] delete message");
        self.messages.lock().remove(message_id);
        self.push(PlatformCall::Delete {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(())
    }

    async fn send_direct_message(&self, user_id: &str, content: &str) -> Result<()> {
        info!(user = %user_id, "[dry-run] direct message: {}", content);
        self.push(PlatformCall::DirectMessage {
            user_id: user_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn send_rich_message(&self, channel_id: &str, message: &RichMessage) -> Result<()> {
        info!(
            channel = %channel_id,
            title = %message.title,
            controls = message.controls.len(),
            "[dry-run] rich message"
        );
        self.push(PlatformCall::RichMessage {
            channel_id: channel_id.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn fetch_message(&self, _channel_id: &str, message_id: &str) -> Result<Option<Message>> {
        Ok(self.messages.lock().get(message_id).cloned())
    }

    async fn channel_parent(&self, channel_id: &str) -> Result<Option<String>> {
        Ok(self.parents.get(channel_id).cloned())
    }

    async fn can_manage_messages(&self, user_id: &str, _channel_id: &str) -> Result<bool> {
        Ok(self.moderators.contains(user_id))
    }
}
