//! Moderation pipeline
//!
//! Wires every component together in the order a message travels:
//! admission, hard-block fast path, rate limiting, prompt building,
//! classification, decision, then actions. Interaction events take the
//! out-of-band route through the correction handler.

use scamguard_classifiers::{ClassifierBackend, ClassifierGateway, PromptBuilder};
use scamguard_core::{
    ChatPlatform, Decision, Error, InteractionEvent, InteractionReply, LabeledExample, Message,
    Result,
};
use scamguard_memory::{ExampleStore, FewShotConfig};
use scamguard_policy::{
    ActionExecutor, ActionOutcome, Admission, AdmissionFilter, CorrectionHandler, DecisionEngine,
    MessageCache, ModerationConfig, RateDecision, RateLimiter,
};
use scamguard_telemetry::{
    ActionEvent, ActionLog, ClassificationSource, DebugTracer, ModerationMetrics, TraceReport,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What happened to one message
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Stopped at admission
    Skipped(Admission),

    /// Triggered but suppressed by the cooldown or the token bucket
    RateLimited(RateDecision),

    /// A decision was produced and acted upon
    Moderated(Box<Moderated>),
}

impl ProcessOutcome {
    /// Label used for the `outcome` metric
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped(admission) => admission.outcome(),
            Self::RateLimited(_) => "rate_limited",
            Self::Moderated(_) => "classified",
        }
    }

    pub fn moderated(&self) -> Option<&Moderated> {
        match self {
            Self::Moderated(m) => Some(m),
            _ => None,
        }
    }
}

/// A message that reached a decision
#[derive(Debug, Serialize)]
pub struct Moderated {
    pub decision: Decision,

    /// `classifier`, `fallback` or `hard_block`
    pub source: &'static str,

    /// Raw classifier completion, empty when the classifier was not used
    pub raw: String,

    pub actions: ActionOutcome,
}

/// The complete moderation pipeline
pub struct ModerationPipeline {
    platform: Arc<dyn ChatPlatform>,
    admission: AdmissionFilter,
    rate_limiter: RateLimiter,
    prompts: PromptBuilder,
    store: Arc<ExampleStore>,
    few_shot: FewShotConfig,
    gateway: ClassifierGateway,
    decisions: DecisionEngine,
    executor: ActionExecutor,
    corrections: CorrectionHandler,
    cache: Arc<MessageCache>,
    tracer: DebugTracer,
    action_log: Arc<ActionLog>,
    metrics: ModerationMetrics,
}

impl ModerationPipeline {
    /// Build the pipeline from a loaded config.
    ///
    /// Fails when a trigger or hard-block pattern does not compile.
    pub fn new(
        config: &ModerationConfig,
        platform: Arc<dyn ChatPlatform>,
        backend: Arc<dyn ClassifierBackend>,
        action_log: Arc<ActionLog>,
    ) -> Result<Self> {
        let metrics = ModerationMetrics::new();
        let store = Arc::new(ExampleStore::open(&config.examples_dir));
        let cache = Arc::new(MessageCache::from_config(&config.message_cache));

        let gateway = ClassifierGateway::new(backend, config.model.clone())
            .with_timeout(config.classifier_timeout());

        let executor = ActionExecutor::new(
            Arc::clone(&platform),
            Arc::clone(&store),
            Arc::clone(&action_log),
            config,
        )
        .with_metrics(metrics.clone());

        let corrections = CorrectionHandler::new(
            Arc::clone(&platform),
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&action_log),
        )
        .with_metrics(metrics.clone());

        info!(
            backend = %gateway.backend_name(),
            model = %gateway.model(),
            production_ready = config.production_ready,
            triggers = config.trigger_patterns.len(),
            hard_blocks = config.hard_block_regexes.len(),
            "Moderation pipeline ready"
        );

        Ok(Self {
            admission: AdmissionFilter::from_config(config)?,
            rate_limiter: RateLimiter::new(&config.rate_limit),
            prompts: PromptBuilder::new()?,
            store,
            few_shot: config.few_shot.clone(),
            gateway,
            decisions: DecisionEngine::new(config.moderation.delete_if_hard_block_regex)?,
            executor,
            corrections,
            cache,
            tracer: DebugTracer::new(
                Arc::clone(&platform),
                config.channels.debug_channel_id.clone(),
            ),
            platform,
            action_log,
            metrics,
        })
    }

    pub fn metrics(&self) -> &ModerationMetrics {
        &self.metrics
    }

    pub fn store(&self) -> &ExampleStore {
        &self.store
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.action_log
    }

    /// Run one message through the pipeline
    pub async fn process(&self, message: Message) -> ProcessOutcome {
        let outcome = self.run(message).await;
        self.metrics.record_message(outcome.as_str());
        outcome
    }

    /// Process a message on its own task. The caller never waits on
    /// classification.
    pub fn dispatch(self: &Arc<Self>, message: Message) -> JoinHandle<ProcessOutcome> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.process(message).await })
    }

    /// Handle a moderator control press
    pub async fn on_interaction(&self, event: &InteractionEvent) -> InteractionReply {
        self.corrections.handle(event).await
    }

    async fn run(&self, message: Message) -> ProcessOutcome {
        let parent = self.parent_category(&message).await;
        let admission = self.admission.evaluate(&message, parent.as_deref());
        let Admission::Triggered { hard_blocked } = admission else {
            debug!(message_id = %message.id, outcome = admission.outcome(), "Not admitted");
            return ProcessOutcome::Skipped(admission);
        };

        self.cache.insert(message.clone());

        if let Some(decision) = self.decisions.fast_path(hard_blocked) {
            info!(message_id = %message.id, channel = %message.channel_id, "Hard block");
            return self
                .conclude(
                    &message,
                    decision,
                    ClassificationSource::HardBlock,
                    hard_blocked,
                    String::new(),
                )
                .await;
        }

        let gate = self.rate_limiter.check(&message.channel_id);
        if !gate.is_admitted() {
            debug!(message_id = %message.id, channel = %message.channel_id, gate = ?gate, "Rate limited");
            return ProcessOutcome::RateLimited(gate);
        }

        let (decision, source, raw) = self.classify(&message, hard_blocked).await;
        self.conclude(&message, decision, source, hard_blocked, raw).await
    }

    /// Category lookup, only when a category whitelist needs it
    async fn parent_category(&self, message: &Message) -> Option<String> {
        if !self.admission.needs_parent() {
            return None;
        }
        match self.platform.channel_parent(&message.channel_id).await {
            Ok(parent) => parent,
            Err(e) => {
                warn!(channel = %message.channel_id, error = %e, "Channel lookup failed");
                None
            }
        }
    }

    async fn classify(
        &self,
        message: &Message,
        hard_blocked: bool,
    ) -> (Decision, ClassificationSource, String) {
        let examples = match self.load_examples().await {
            Ok(examples) => examples,
            Err(e) => {
                warn!(error = %e, "Failed to load examples, prompting without them");
                Vec::new()
            }
        };
        let prompt = self.prompts.build(
            &message.content,
            Some(message.author_age_days()),
            &examples,
        );

        let result = self.gateway.classify(&prompt.system, &prompt.user).await;
        if let Some(failure) = &result.failure {
            self.action_log.record(ActionEvent::ClassifierError {
                message_id: message.id.clone(),
                backend: self.gateway.backend_name().to_string(),
                error: failure.to_string(),
            });
        }
        debug!(
            message_id = %message.id,
            examples = examples.len(),
            latency_ms = result.latency_ms,
            parsed = result.response.json.is_some(),
            "Classifier responded"
        );

        let (decision, source) =
            self.decisions
                .decide(&result.response, &message.content, &prompt.links, hard_blocked);
        (decision, source, result.response.raw)
    }

    async fn load_examples(&self) -> Result<Vec<LabeledExample>> {
        let store = Arc::clone(&self.store);
        let few_shot = self.few_shot.clone();
        tokio::task::spawn_blocking(move || store.prompt_examples(&few_shot))
            .await
            .map_err(|e| Error::internal(format!("Example load task failed: {}", e)))?
    }

    async fn conclude(
        &self,
        message: &Message,
        decision: Decision,
        source: ClassificationSource,
        hard_blocked: bool,
        raw: String,
    ) -> ProcessOutcome {
        self.metrics.record_classification(source);

        self.tracer.trace(TraceReport {
            channel_id: message.channel_id.clone(),
            message_id: message.id.clone(),
            author_id: message.author.id.clone(),
            content: message.content.clone(),
            triggered: true,
            hard_blocked,
            decision: decision.clone(),
            raw: raw.clone(),
        });

        let actions = self.executor.execute(message, &decision).await;

        ProcessOutcome::Moderated(Box::new(Moderated {
            decision,
            source: source.as_str(),
            raw,
            actions,
        }))
    }
}
