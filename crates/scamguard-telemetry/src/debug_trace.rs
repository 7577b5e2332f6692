//! Debug traces
//!
//! When a debug channel is configured every classified message is echoed
//! there with its decision and the raw completion. Traces are sent from a
//! detached task; failures end up in the log and nowhere else.

use scamguard_core::{
    truncate, ChatPlatform, Control, ControlStyle, Decision, InteractionAction, InteractionId,
    RichMessage,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

const RAW_LIMIT: usize = 900;
const CONTENT_LIMIT: usize = 500;
const SCAM_COLOR: u32 = 0xE74C3C;
const CLEAN_COLOR: u32 = 0x95A5A6;

/// Everything shown in one trace
#[derive(Debug, Clone)]
pub struct TraceReport {
    pub channel_id: String,
    pub message_id: String,
    pub author_id: String,
    pub content: String,
    pub triggered: bool,
    pub hard_blocked: bool,
    pub decision: Decision,

    /// Raw classifier completion, empty for hard blocks and failures
    pub raw: String,
}

impl TraceReport {
    /// Render the trace as a rich message
    pub fn render(&self) -> RichMessage {
        let decision = &self.decision;
        let verdict = format!("{} ({:.2})", decision.predicted_label(), decision.confidence);
        let list = |items: &[String], sep: &str| {
            if items.is_empty() {
                "none".to_string()
            } else {
                items.join(sep)
            }
        };
        let raw = if self.raw.trim().is_empty() {
            "(empty)".to_string()
        } else {
            truncate(&self.raw, RAW_LIMIT)
        };

        let mut message = RichMessage::new("Debug Trace")
            .description(truncate(&self.content, CONTENT_LIMIT))
            .color(if decision.is_scam { SCAM_COLOR } else { CLEAN_COLOR })
            .field("Message", format!("<#{}> {}", self.channel_id, self.message_id), false)
            .field("Author", format!("<@{}>", self.author_id), true)
            .field("Triggered", self.triggered.to_string(), true)
            .field("Hard block", self.hard_blocked.to_string(), true)
            .field("Decision", verdict, true)
            .field("Reasons", list(&decision.reasons, " • "), false)
            .field("Tags", list(&decision.tags, ", "), false)
            .field("Raw", raw, false);

        if !decision.is_scam {
            message = message.control(Control::new(
                InteractionId::new(
                    InteractionAction::FlagFalseNegative,
                    &self.channel_id,
                    &self.message_id,
                ),
                "Flag as scam",
                ControlStyle::Danger,
            ));
        }

        message
    }
}

/// Posts traces to the debug channel
#[derive(Clone)]
pub struct DebugTracer {
    platform: Arc<dyn ChatPlatform>,
    channel_id: Option<String>,
}

impl DebugTracer {
    pub fn new(platform: Arc<dyn ChatPlatform>, channel_id: Option<String>) -> Self {
        Self {
            platform,
            channel_id: channel_id.filter(|c| !c.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel_id.is_some()
    }

    /// Send a trace in the background. Returns `None` when tracing is off.
    pub fn trace(&self, report: TraceReport) -> Option<JoinHandle<()>> {
        let channel_id = self.channel_id.clone()?;
        let platform = Arc::clone(&self.platform);

        Some(tokio::spawn(async move {
            let message = report.render();
            if let Err(e) = platform.send_rich_message(&channel_id, &message).await {
                warn!(
                    channel = %channel_id,
                    message_id = %report.message_id,
                    error = %e,
                    "Failed to send debug trace"
                );
            }
        }))
    }
}
