//! Action executor
//!
//! Performs the side effects of a decision, handling:
//! - Deleting the message and notifying its author
//! - Posting the moderator alert
//! - Writing the automated example back to the store
//!
//! Platform failures are logged and never stop the remaining steps.

use scamguard_core::{ChatPlatform, Decision, Error, ExampleMeta, LabeledExample, Message, Result};
use scamguard_memory::{AdoptionInput, ExampleStore};
use scamguard_telemetry::{ActionEvent, ActionLog, ModerationMetrics};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::action::ActionPlan;
use crate::alert::build_alert;
use crate::config::{ModerationConfig, ModerationPolicy};

/// Private message sent to authors of deleted messages
pub const DELETE_NOTICE: &str =
    "Your message was removed for suspected scam content. Contact the moderators if this is a mistake.";

/// What actually happened
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionOutcome {
    pub plan: ActionPlan,
    pub deleted: bool,
    pub notified: bool,
    pub alerted: bool,

    /// Example written to the learned partition, if any
    pub adopted: Option<LabeledExample>,
}

/// Executes moderation actions against the chat platform
pub struct ActionExecutor {
    platform: Arc<dyn ChatPlatform>,
    store: Arc<ExampleStore>,
    action_log: Arc<ActionLog>,
    metrics: ModerationMetrics,
    policy: ModerationPolicy,
    production_ready: bool,
    mod_channel_id: Option<String>,
}

impl ActionExecutor {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        store: Arc<ExampleStore>,
        action_log: Arc<ActionLog>,
        config: &ModerationConfig,
    ) -> Self {
        Self {
            platform,
            store,
            action_log,
            metrics: ModerationMetrics::default(),
            policy: config.moderation.clone(),
            production_ready: config.production_ready,
            mod_channel_id: config.channels.mod_channel_id.clone(),
        }
    }

    pub fn with_metrics(mut self, metrics: ModerationMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Plan and perform every action for a decision
    pub async fn execute(&self, message: &Message, decision: &Decision) -> ActionOutcome {
        let plan = ActionPlan::for_decision(decision, &self.policy, self.production_ready);
        let mut outcome = ActionOutcome {
            plan,
            ..Default::default()
        };

        if plan.delete {
            outcome.deleted = self.delete(message).await;
            if outcome.deleted && plan.notify_author {
                outcome.notified = self.notify_author(message).await;
            }
        }

        if plan.alert {
            outcome.alerted = self.alert(message, decision, outcome.deleted).await;
        }

        outcome.adopted = self.adopt(message, decision).await;

        info!(
            message_id = %message.id,
            channel = %message.channel_id,
            is_scam = decision.is_scam,
            confidence = decision.confidence,
            deleted = outcome.deleted,
            alerted = outcome.alerted,
            "Decision handled"
        );

        outcome
    }

    async fn delete(&self, message: &Message) -> bool {
        match self.platform.delete_message(&message.channel_id, &message.id).await {
            Ok(()) => {
                self.metrics.record_action("delete");
                self.action_log.record(ActionEvent::Delete {
                    channel_id: message.channel_id.clone(),
                    message_id: message.id.clone(),
                    author_id: message.author.id.clone(),
                });
                true
            }
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Failed to delete message");
                self.action_log.record(ActionEvent::DeleteFailed {
                    channel_id: message.channel_id.clone(),
                    message_id: message.id.clone(),
                    error: e.to_string(),
                });
                false
            }
        }
    }

    async fn notify_author(&self, message: &Message) -> bool {
        match self
            .platform
            .send_direct_message(&message.author.id, DELETE_NOTICE)
            .await
        {
            Ok(()) => {
                self.metrics.record_action("dm");
                true
            }
            Err(e) => {
                warn!(author = %message.author.id, error = %e, "Failed to notify author");
                false
            }
        }
    }

    async fn alert(&self, message: &Message, decision: &Decision, deleted: bool) -> bool {
        let Some(channel_id) = &self.mod_channel_id else {
            debug!("No moderator channel configured, skipping alert");
            return false;
        };

        let alert = build_alert(message, decision, self.production_ready, deleted);
        match self.platform.send_rich_message(channel_id, &alert).await {
            Ok(()) => {
                self.metrics.record_action("alert");
                self.action_log.record(ActionEvent::Alert {
                    channel_id: message.channel_id.clone(),
                    message_id: message.id.clone(),
                    confidence: decision.confidence,
                });
                true
            }
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Failed to post moderator alert");
                false
            }
        }
    }

    async fn adopt(&self, message: &Message, decision: &Decision) -> Option<LabeledExample> {
        let meta = ExampleMeta {
            channel: Some(message.channel_id.clone()),
            author_age_days: Some(message.author_age_days()),
            message_id: Some(message.id.clone()),
        };
        let mut input = AdoptionInput::automated(
            message.content.clone(),
            decision.predicted_label(),
            decision.confidence,
            meta,
        );
        if let Some(reason) = decision.reasons.first() {
            input = input.with_reason(reason.clone());
        }

        match adopt_blocking(&self.store, input).await {
            Ok(Some(example)) => {
                self.action_log.record(ActionEvent::Adopt {
                    message_id: example.meta.message_id.clone(),
                    label: example.label,
                    weight: example.weight,
                    correction: false,
                });
                Some(example)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Failed to adopt example");
                None
            }
        }
    }
}

/// Run a store write on the blocking pool
pub(crate) async fn adopt_blocking(
    store: &Arc<ExampleStore>,
    input: AdoptionInput,
) -> Result<Option<LabeledExample>> {
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || store.adopt(input))
        .await
        .map_err(|e| Error::internal(format!("Example store task failed: {}", e)))?
}
