//! Chat platform contract
//!
//! The moderation pipeline never talks to a gateway directly. Everything it
//! needs from the chat platform goes through [`ChatPlatform`]: deleting a
//! message, sending a direct message, posting a rich alert with interactive
//! controls, and a few metadata lookups.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::interaction::InteractionId;
use crate::{Message, Result};

/// Capabilities the pipeline invokes on the chat platform
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Delete a message
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()>;

    /// Send a private message to a user
    async fn send_direct_message(&self, user_id: &str, content: &str) -> Result<()>;

    /// Send a message with rich content and interactive controls
    async fn send_rich_message(&self, channel_id: &str, message: &RichMessage) -> Result<()>;

    /// Fetch a live message, `Ok(None)` if it no longer exists
    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<Option<Message>>;

    /// Parent category of a channel, if any
    async fn channel_parent(&self, channel_id: &str) -> Result<Option<String>>;

    /// Whether a user may manage messages in a channel
    async fn can_manage_messages(&self, user_id: &str, channel_id: &str) -> Result<bool>;
}

/// A field of a rich message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Visual style of an interactive control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlStyle {
    Danger,
    Success,
    Secondary,
}

/// A button attached to a rich message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub id: InteractionId,
    pub label: String,
    pub style: ControlStyle,
    pub disabled: bool,
}

impl Control {
    pub fn new(id: InteractionId, label: impl Into<String>, style: ControlStyle) -> Self {
        Self {
            id,
            label: label.into(),
            style,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Message with embedded summary and controls (alerts, debug traces)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichMessage {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<RichField>,
    pub footer: Option<String>,
    pub controls: Vec<Control>,
}

impl RichMessage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(RichField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }

    /// Value of the first field with the given name
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Truncate to at most `max` characters, appending an ellipsis when cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}
