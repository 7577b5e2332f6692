//! Moderation metrics
//!
//! Counters are kept locally for snapshots (the `check` command prints
//! them) and mirrored to the `metrics` facade for Prometheus export.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Where a decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    Classifier,
    Fallback,
    HardBlock,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classifier => "classifier",
            Self::Fallback => "fallback",
            Self::HardBlock => "hard_block",
        }
    }
}

/// Register descriptions with the installed recorder
pub fn describe() {
    metrics::describe_counter!(
        "scamguard_messages_total",
        "Messages seen by the pipeline, by outcome"
    );
    metrics::describe_counter!(
        "scamguard_classifications_total",
        "Decisions produced, by source"
    );
    metrics::describe_counter!(
        "scamguard_actions_total",
        "Moderation side effects performed, by action"
    );
    metrics::describe_counter!(
        "scamguard_corrections_total",
        "Moderator corrections applied, by action"
    );
}

/// Moderation counters
#[derive(Clone, Default)]
pub struct ModerationMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    messages: AtomicU64,
    rate_limited: AtomicU64,
    classifier: AtomicU64,
    fallback: AtomicU64,
    hard_block: AtomicU64,
    deletions: AtomicU64,
    alerts: AtomicU64,
    corrections: AtomicU64,
}

impl ModerationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message and how far it got
    pub fn record_message(&self, outcome: &'static str) {
        self.inner.messages.fetch_add(1, Ordering::Relaxed);
        if outcome == "rate_limited" {
            self.inner.rate_limited.fetch_add(1, Ordering::Relaxed);
        }
        metrics::counter!("scamguard_messages_total", "outcome" => outcome).increment(1);
    }

    /// Record a decision
    pub fn record_classification(&self, source: ClassificationSource) {
        let counter = match source {
            ClassificationSource::Classifier => &self.inner.classifier,
            ClassificationSource::Fallback => &self.inner.fallback,
            ClassificationSource::HardBlock => &self.inner.hard_block,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("scamguard_classifications_total", "source" => source.as_str())
            .increment(1);
    }

    /// Record a side effect (delete, dm, alert)
    pub fn record_action(&self, action: &'static str) {
        match action {
            "delete" => {
                self.inner.deletions.fetch_add(1, Ordering::Relaxed);
            }
            "alert" => {
                self.inner.alerts.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        metrics::counter!("scamguard_actions_total", "action" => action).increment(1);
    }

    /// Record a moderator correction
    pub fn record_correction(&self, action: &'static str) {
        self.inner.corrections.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("scamguard_corrections_total", "action" => action).increment(1);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages: self.inner.messages.load(Ordering::Relaxed),
            rate_limited: self.inner.rate_limited.load(Ordering::Relaxed),
            classifier: self.inner.classifier.load(Ordering::Relaxed),
            fallback: self.inner.fallback.load(Ordering::Relaxed),
            hard_block: self.inner.hard_block.load(Ordering::Relaxed),
            deletions: self.inner.deletions.load(Ordering::Relaxed),
            alerts: self.inner.alerts.load(Ordering::Relaxed),
            corrections: self.inner.corrections.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub messages: u64,
    pub rate_limited: u64,
    pub classifier: u64,
    pub fallback: u64,
    pub hard_block: u64,
    pub deletions: u64,
    pub alerts: u64,
    pub corrections: u64,
}

impl MetricsSnapshot {
    /// Decisions produced from any source
    pub fn decisions(&self) -> u64 {
        self.classifier + self.fallback + self.hard_block
    }

    /// Share of decisions that fell back to the heuristic
    pub fn fallback_rate(&self) -> f64 {
        let decisions = self.decisions();
        if decisions == 0 {
            0.0
        } else {
            self.fallback as f64 / decisions as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let metrics = ModerationMetrics::new();

        metrics.record_message("classified");
        metrics.record_message("rate_limited");
        metrics.record_classification(ClassificationSource::Classifier);
        metrics.record_classification(ClassificationSource::Fallback);
        metrics.record_action("delete");
        metrics.record_action("dm");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages, 2);
        assert_eq!(snapshot.rate_limited, 1);
        assert_eq!(snapshot.decisions(), 2);
        assert_eq!(snapshot.deletions, 1);
        assert_eq!(snapshot.alerts, 0);
        assert_eq!(snapshot.fallback_rate(), 0.5);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = ModerationMetrics::new();
        let clone = metrics.clone();
        clone.record_correction("scam_correct");
        assert_eq!(metrics.snapshot().corrections, 1);
    }
}
