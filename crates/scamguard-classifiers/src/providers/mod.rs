//! Classifier backend adapters
//!
//! One adapter per wire format. OpenAI, Groq, xAI and the Hugging Face router
//! all speak the chat-completions dialect and share [`OpenAiCompatibleBackend`].

mod anthropic;
mod huggingface;
mod mistral;
mod openai;

pub use anthropic::AnthropicBackend;
pub use huggingface::HuggingFaceBackend;
pub use mistral::MistralBackend;
pub use openai::OpenAiCompatibleBackend;

use crate::classifier::{ClassifierBackend, ProviderKind};
use reqwest::header::HeaderMap;
use scamguard_core::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const XAI_BASE_URL: &str = "https://api.x.ai/v1";
const HF_ROUTER_BASE_URL: &str = "https://router.huggingface.co/v1";

/// Credentials and endpoint overrides for every backend
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub xai_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,

    pub openai_base_url: Option<String>,
    pub groq_base_url: Option<String>,
    pub xai_base_url: Option<String>,
}

impl ProviderCredentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            openai_api_key: var("OPENAI_API_KEY"),
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            mistral_api_key: var("MISTRAL_API_KEY"),
            groq_api_key: var("GROQ_API_KEY"),
            xai_api_key: var("XAI_API_KEY"),
            huggingface_api_key: var("HUGGINGFACE_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL"),
            groq_base_url: var("GROQ_BASE_URL"),
            xai_base_url: var("XAI_BASE_URL"),
        }
    }

    /// API key for a backend, if configured
    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        let key = match kind {
            ProviderKind::OpenAi => &self.openai_api_key,
            ProviderKind::Anthropic => &self.anthropic_api_key,
            ProviderKind::Mistral => &self.mistral_api_key,
            ProviderKind::Groq => &self.groq_api_key,
            ProviderKind::Xai => &self.xai_api_key,
            ProviderKind::HuggingFace | ProviderKind::HuggingFaceRouter => {
                &self.huggingface_api_key
            }
        };
        key.as_deref()
    }

    /// Base URL for an OpenAI-compatible backend
    fn base_url(&self, kind: ProviderKind) -> String {
        let (configured, default) = match kind {
            ProviderKind::Groq => (self.groq_base_url.as_deref(), GROQ_BASE_URL),
            ProviderKind::Xai => (self.xai_base_url.as_deref(), XAI_BASE_URL),
            ProviderKind::HuggingFaceRouter => (None, HF_ROUTER_BASE_URL),
            _ => (self.openai_base_url.as_deref(), OPENAI_BASE_URL),
        };
        configured
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ProviderCredentials")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("mistral_api_key", &redact(&self.mistral_api_key))
            .field("groq_api_key", &redact(&self.groq_api_key))
            .field("xai_api_key", &redact(&self.xai_api_key))
            .field("huggingface_api_key", &redact(&self.huggingface_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("groq_base_url", &self.groq_base_url)
            .field("xai_base_url", &self.xai_base_url)
            .finish()
    }
}

/// Build the backend selected by name.
///
/// Fails when the name is unknown or the backend's credential is missing.
pub fn backend_by_name(
    name: &str,
    credentials: &ProviderCredentials,
    client: reqwest::Client,
) -> Result<Arc<dyn ClassifierBackend>> {
    let kind: ProviderKind = name.parse()?;
    let api_key = credentials
        .api_key(kind)
        .ok_or_else(|| {
            Error::config(format!(
                "{} is required for provider '{}'",
                kind.credential_var(),
                kind
            ))
        })?
        .to_string();

    let backend: Arc<dyn ClassifierBackend> = match kind {
        ProviderKind::OpenAi
        | ProviderKind::Groq
        | ProviderKind::Xai
        | ProviderKind::HuggingFaceRouter => Arc::new(OpenAiCompatibleBackend::new(
            kind.as_str(),
            credentials.base_url(kind),
            api_key,
            client,
        )),
        ProviderKind::Anthropic => Arc::new(AnthropicBackend::new(api_key, client)),
        ProviderKind::Mistral => Arc::new(MistralBackend::new(api_key, client)),
        ProviderKind::HuggingFace => Arc::new(HuggingFaceBackend::new(api_key, client)),
    };

    debug!(provider = %kind, "Classifier backend selected");
    Ok(backend)
}

/// POST a JSON body and decode the JSON envelope, failing on non-success status
async fn post_json(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    let response = client
        .post(url)
        .headers(headers)
        .json(body)
        .send()
        .await
        .map_err(|e| Error::classifier(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::classifier(format!("failed to read response body: {}", e)))?;

    if !status.is_success() {
        return Err(Error::classifier(format!(
            "backend returned {}: {}",
            status,
            scamguard_core::truncate(&text, 300)
        )));
    }

    serde_json::from_str(&text)
        .map_err(|e| Error::classifier(format!("backend returned non-JSON envelope: {}", e)))
}

fn bearer_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = format!("Bearer {}", api_key)
        .parse()
        .map_err(|_| Error::config("API key contains invalid header characters"))?;
    headers.insert(reqwest::header::AUTHORIZATION, value);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> ProviderCredentials {
        ProviderCredentials {
            openai_api_key: Some("sk-test".into()),
            groq_base_url: Some("https://groq.local/v1/".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_backend_selection_by_name() {
        let backend = backend_by_name("openai", &creds(), reqwest::Client::new()).unwrap();
        assert_eq!(backend.name(), "openai");
    }

    #[test]
    fn test_missing_credential_is_config_error() {
        let err = backend_by_name("anthropic", &creds(), reqwest::Client::new())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let err = backend_by_name("carrier-pigeon", &creds(), reqwest::Client::new())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_base_url_overrides() {
        let creds = creds();
        assert_eq!(creds.base_url(ProviderKind::OpenAi), OPENAI_BASE_URL);
        assert_eq!(creds.base_url(ProviderKind::Groq), "https://groq.local/v1");
        assert_eq!(creds.base_url(ProviderKind::HuggingFaceRouter), HF_ROUTER_BASE_URL);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let rendered = format!("{:?}", creds());
        assert!(!rendered.contains("sk-test"));
        assert!(rendered.contains("<set>"));
    }
}
