//! Classifier gateway
//!
//! Wraps the configured backend with a bounded timeout. Neither transport
//! errors nor timeouts cross this boundary: both come back as an empty
//! [`ProviderResponse`], which callers treat as "no parsed JSON" and answer
//! with the fallback heuristic.

use scamguard_core::{Error, ProviderResponse};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::classifier::ClassifierBackend;

/// Default upper bound for a single classifier call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Result of a gateway call, including the failure that was swallowed
#[derive(Debug)]
pub struct GatewayResponse {
    /// Response to feed into the decision engine
    pub response: ProviderResponse,

    /// Failure that caused an empty response, if any
    pub failure: Option<Error>,

    /// Wall-clock latency in milliseconds
    pub latency_ms: u64,
}

/// Uniform entry point for classification
#[derive(Clone)]
pub struct ClassifierGateway {
    backend: Arc<dyn ClassifierBackend>,
    model: String,
    timeout: Duration,
}

impl ClassifierGateway {
    pub fn new(backend: Arc<dyn ClassifierBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Classify, degrading every failure to an empty response
    pub async fn classify(&self, system_prompt: &str, user_prompt: &str) -> GatewayResponse {
        let start = Instant::now();
        let call = self
            .backend
            .classify(&self.model, system_prompt, user_prompt);

        let (response, failure) = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => (response, None),
            Ok(Err(e)) => {
                warn!(backend = %self.backend.name(), error = %e, "Classifier call failed");
                (ProviderResponse::empty(), Some(e))
            }
            Err(_) => {
                warn!(
                    backend = %self.backend.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Classifier call timed out"
                );
                (ProviderResponse::empty(), Some(Error::Timeout))
            }
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(
            backend = %self.backend.name(),
            model = %self.model,
            latency_ms,
            parsed = response.json.is_some(),
            "Classifier call finished"
        );

        GatewayResponse {
            response,
            failure,
            latency_ms,
        }
    }
}
