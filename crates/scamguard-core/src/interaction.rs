//! Moderator interaction identifiers and replies
//!
//! Interactive controls carry a composite id `<action>:<channel>:<message>`
//! so the correction handler can act without any server-side session state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::platform::RichMessage;
use crate::Error;

/// Moderator action encoded in a control id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionAction {
    /// Delete the target message now
    DeleteNow,
    /// The automated scam verdict was right
    Correct,
    /// The automated scam verdict was wrong
    Incorrect,
    /// A message judged not-scam actually is a scam
    FlagFalseNegative,
}

impl InteractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteNow => "scam_del",
            Self::Correct => "scam_correct",
            Self::Incorrect => "scam_incorrect",
            Self::FlagFalseNegative => "flag_false",
        }
    }
}

impl FromStr for InteractionAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scam_del" => Ok(Self::DeleteNow),
            "scam_correct" => Ok(Self::Correct),
            "scam_incorrect" => Ok(Self::Incorrect),
            "flag_false" => Ok(Self::FlagFalseNegative),
            other => Err(Error::internal(format!("unknown interaction action '{}'", other))),
        }
    }
}

/// Composite control id: `{action}:{channel}:{message}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InteractionId {
    pub action: InteractionAction,
    pub channel_id: String,
    pub message_id: String,
}

impl InteractionId {
    pub fn new(
        action: InteractionAction,
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            action,
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.action.as_str(), self.channel_id, self.message_id)
    }
}

impl FromStr for InteractionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let action = parts.next().unwrap_or_default().parse()?;
        let channel_id = parts.next().unwrap_or_default();
        let message_id = parts.next().unwrap_or_default();

        if channel_id.is_empty() || message_id.is_empty() {
            return Err(Error::internal(format!("malformed interaction id '{}'", s)));
        }

        Ok(Self::new(action, channel_id, message_id))
    }
}

impl TryFrom<String> for InteractionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InteractionId> for String {
    fn from(id: InteractionId) -> Self {
        id.to_string()
    }
}

/// A button press delivered by the chat platform
#[derive(Debug, Clone)]
pub struct InteractionEvent {
    /// Raw control id
    pub custom_id: String,

    /// Moderator who pressed the control
    pub moderator_id: String,

    /// Moderator display name
    pub moderator_name: String,

    /// The alert the control belongs to, when the platform supplies it
    pub alert: Option<RichMessage>,
}

/// Response the platform should render for an interaction
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionReply {
    /// Unrecognised interaction, nothing to render
    Ignored,

    /// Reply visible only to the moderator
    Private(String),

    /// Replace the alert in place, optionally followed by a private note
    UpdateAlert {
        alert: RichMessage,
        follow_up: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_id_round_trip() {
        let id: InteractionId = "scam_correct:123:456".parse().unwrap();
        assert_eq!(id.action, InteractionAction::Correct);
        assert_eq!(id.channel_id, "123");
        assert_eq!(id.message_id, "456");
        assert_eq!(id.to_string(), "scam_correct:123:456");
    }

    #[test]
    fn test_interaction_id_rejects_malformed() {
        assert!("scam_correct:123".parse::<InteractionId>().is_err());
        assert!("scam_correct::456".parse::<InteractionId>().is_err());
        assert!("launch_rockets:1:2".parse::<InteractionId>().is_err());
        assert!("".parse::<InteractionId>().is_err());
    }

    #[test]
    fn test_interaction_id_serde_as_string() {
        let id = InteractionId::new(InteractionAction::FlagFalseNegative, "c", "m");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"flag_false:c:m\"");
    }
}
