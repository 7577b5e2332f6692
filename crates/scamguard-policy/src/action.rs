//! Moderation actions
//!
//! The pure half of the action executor: which side effects a decision
//! calls for under the configured thresholds and toggles.

use scamguard_core::Decision;
use serde::Serialize;

use crate::config::ModerationPolicy;

/// Side effects a decision calls for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionPlan {
    /// Delete the message
    pub delete: bool,

    /// Notify the author after a successful delete
    pub notify_author: bool,

    /// Post a moderator alert
    pub alert: bool,
}

impl ActionPlan {
    /// Plan the actions for a decision.
    ///
    /// Deletion needs a scam verdict, the delete toggle, a hard block or
    /// enough confidence, and `productionReady`. Alerts need a scam verdict
    /// above the flag threshold.
    pub fn for_decision(decision: &Decision, policy: &ModerationPolicy, production_ready: bool) -> Self {
        let delete = decision.is_scam
            && policy.actions.delete_message
            && (decision.hard_block || decision.confidence >= policy.min_confidence_to_delete)
            && production_ready;

        let alert = policy.actions.post_mod_alert
            && decision.is_scam
            && decision.confidence >= policy.min_confidence_to_flag;

        Self {
            delete,
            notify_author: delete && policy.actions.dm_user_on_delete,
            alert,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.delete && !self.alert
    }
}
