//! Correction handler
//!
//! Applies moderator feedback from alert and debug-trace controls. Every
//! correction goes through the example store's correction path, so a
//! moderator's label always supersedes the automated one.

use scamguard_core::{
    ChatPlatform, ExampleMeta, InteractionAction, InteractionEvent, InteractionId,
    InteractionReply, Label, Message,
};
use scamguard_memory::{AdoptionInput, ExampleStore};
use scamguard_telemetry::{ActionEvent, ActionLog, ModerationMetrics};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::alert::{resolve_alert, strip_controls};
use crate::cache::MessageCache;
use crate::executor::adopt_blocking;

pub const PERMISSION_DENIED: &str = "You lack permission to perform this action.";
pub const PERMISSION_CHECK_FAILED: &str = "Failed to verify your permissions.";
pub const MESSAGE_NOT_FOUND: &str = "Original message could not be found.";
pub const CORRECTION_FAILED: &str = "Failed to record the correction.";

/// Labels and wording for a labelling action
struct Verdict {
    predicted: Label,
    ground_truth: Label,
    verb: &'static str,
    footer: &'static str,
}

fn verdict(action: InteractionAction) -> Option<Verdict> {
    let (predicted, ground_truth, verb, footer) = match action {
        InteractionAction::Correct => (Label::Scam, Label::Scam, "approved", "Marked as correct by"),
        InteractionAction::Incorrect => {
            (Label::Scam, Label::NotScam, "rejected", "Marked as incorrect by")
        }
        InteractionAction::FlagFalseNegative => {
            (Label::NotScam, Label::Scam, "flagged", "Flagged as scam by")
        }
        InteractionAction::DeleteNow => return None,
    };
    Some(Verdict {
        predicted,
        ground_truth,
        verb,
        footer,
    })
}

/// Handles moderator interaction events
pub struct CorrectionHandler {
    platform: Arc<dyn ChatPlatform>,
    store: Arc<ExampleStore>,
    cache: Arc<MessageCache>,
    action_log: Arc<ActionLog>,
    metrics: ModerationMetrics,
}

impl CorrectionHandler {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        store: Arc<ExampleStore>,
        cache: Arc<MessageCache>,
        action_log: Arc<ActionLog>,
    ) -> Self {
        Self {
            platform,
            store,
            cache,
            action_log,
            metrics: ModerationMetrics::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: ModerationMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Handle one control press
    pub async fn handle(&self, event: &InteractionEvent) -> InteractionReply {
        let id: InteractionId = match event.custom_id.parse() {
            Ok(id) => id,
            Err(e) => {
                debug!(custom_id = %event.custom_id, error = %e, "Ignoring interaction");
                return InteractionReply::Ignored;
            }
        };

        match self
            .platform
            .can_manage_messages(&event.moderator_id, &id.channel_id)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                info!(moderator = %event.moderator_id, action = id.action.as_str(), "Correction denied");
                return InteractionReply::Private(PERMISSION_DENIED.to_string());
            }
            Err(e) => {
                warn!(moderator = %event.moderator_id, error = %e, "Permission lookup failed");
                return InteractionReply::Private(PERMISSION_CHECK_FAILED.to_string());
            }
        }

        let (reply, applied) = match verdict(id.action) {
            None => (self.delete_now(&id, event).await, true),
            Some(verdict) => match self.relabel(&id, event, verdict).await {
                Ok(reply) => (reply, true),
                Err(reply) => (reply, false),
            },
        };

        if applied {
            self.metrics.record_correction(id.action.as_str());
            self.action_log.record(ActionEvent::Correction {
                action: id.action.as_str().to_string(),
                channel_id: id.channel_id.clone(),
                message_id: id.message_id.clone(),
                moderator_id: event.moderator_id.clone(),
            });
        }

        reply
    }

    async fn delete_now(&self, id: &InteractionId, event: &InteractionEvent) -> InteractionReply {
        if let Err(e) = self
            .platform
            .delete_message(&id.channel_id, &id.message_id)
            .await
        {
            warn!(message_id = %id.message_id, error = %e, "Moderator delete failed");
        }

        let follow_up = format!("Deleted message {}.", id.message_id);
        match &event.alert {
            Some(alert) => InteractionReply::UpdateAlert {
                alert: strip_controls(alert),
                follow_up: Some(follow_up),
            },
            None => InteractionReply::Private(follow_up),
        }
    }

    /// Write the moderator's label. `Err` carries the reply for a correction
    /// that could not be applied.
    async fn relabel(
        &self,
        id: &InteractionId,
        event: &InteractionEvent,
        verdict: Verdict,
    ) -> Result<InteractionReply, InteractionReply> {
        let Some(target) = self.resolve_target(id).await else {
            return Err(InteractionReply::Private(MESSAGE_NOT_FOUND.to_string()));
        };

        let meta = ExampleMeta {
            channel: Some(id.channel_id.clone()),
            author_age_days: Some(target.author_age_days()),
            message_id: Some(id.message_id.clone()),
        };
        let input = AdoptionInput::automated(target.content, verdict.predicted, 1.0, meta)
            .with_ground_truth(verdict.ground_truth)
            .with_reason(format!("mod_{}_{}", event.moderator_id, verdict.verb));

        match adopt_blocking(&self.store, input).await {
            Ok(Some(example)) => {
                self.action_log.record(ActionEvent::Adopt {
                    message_id: example.meta.message_id.clone(),
                    label: example.label,
                    weight: example.weight,
                    correction: true,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(message_id = %id.message_id, error = %e, "Failed to record correction");
                return Err(InteractionReply::Private(CORRECTION_FAILED.to_string()));
            }
        }

        let footer = format!("{} {}", verdict.footer, event.moderator_name);
        Ok(match &event.alert {
            Some(alert) => InteractionReply::UpdateAlert {
                alert: resolve_alert(alert, footer),
                follow_up: None,
            },
            None => InteractionReply::Private(footer),
        })
    }

    /// Live message first, then the local cache
    async fn resolve_target(&self, id: &InteractionId) -> Option<Message> {
        match self
            .platform
            .fetch_message(&id.channel_id, &id.message_id)
            .await
        {
            Ok(Some(message)) => return Some(message),
            Ok(None) => debug!(message_id = %id.message_id, "Message gone, trying cache"),
            Err(e) => {
                debug!(message_id = %id.message_id, error = %e, "Fetch failed, trying cache")
            }
        }
        self.cache.get(&id.message_id)
    }
}
