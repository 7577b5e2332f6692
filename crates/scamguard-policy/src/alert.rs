//! Moderator alerts

use scamguard_core::{
    truncate, Control, ControlStyle, Decision, InteractionAction, InteractionId, Message,
    RichMessage,
};

const ALERT_COLOR: u32 = 0xE74C3C;
const DESCRIPTION_LIMIT: usize = 1000;

/// Build the alert posted to the moderator channel.
///
/// Delete is disabled when destructive actions are off or the message is
/// already gone.
pub fn build_alert(
    message: &Message,
    decision: &Decision,
    production_ready: bool,
    already_deleted: bool,
) -> RichMessage {
    let description = if message.content.is_empty() {
        "(no content)".to_string()
    } else {
        truncate(&message.content, DESCRIPTION_LIMIT)
    };
    let reasons = if decision.reasons.is_empty() {
        "n/a".to_string()
    } else {
        decision.reasons.join(" • ")
    };
    let tags = if decision.tags.is_empty() {
        "none".to_string()
    } else {
        decision.tags.join(", ")
    };
    let id = |action| InteractionId::new(action, &message.channel_id, &message.id);

    RichMessage::new("Possible Scam")
        .description(description)
        .color(ALERT_COLOR)
        .field(
            "User",
            format!("<@{}> (~{} days old)", message.author.id, message.author_age_days()),
            false,
        )
        .field("Channel", format!("<#{}>", message.channel_id), true)
        .field("Confidence", format!("{:.2}", decision.confidence), true)
        .field("Reasons", reasons, false)
        .field("Tags", tags, true)
        .field("Original", message.jump_link(), false)
        .footer(format!("productionReady={}", production_ready))
        .control(
            Control::new(id(InteractionAction::DeleteNow), "Delete", ControlStyle::Danger)
                .disabled(!production_ready || already_deleted),
        )
        .control(Control::new(
            id(InteractionAction::Correct),
            "Correct",
            ControlStyle::Success,
        ))
        .control(Control::new(
            id(InteractionAction::Incorrect),
            "Incorrect",
            ControlStyle::Secondary,
        ))
}

/// The alert after a moderator resolved it: every control disabled
pub fn resolve_alert(alert: &RichMessage, footer: impl Into<String>) -> RichMessage {
    let mut resolved = alert.clone().footer(footer);
    for control in &mut resolved.controls {
        control.disabled = true;
    }
    resolved
}

/// The alert after delete-now: controls removed
pub fn strip_controls(alert: &RichMessage) -> RichMessage {
    let mut stripped = alert.clone();
    stripped.controls.clear();
    stripped
}
