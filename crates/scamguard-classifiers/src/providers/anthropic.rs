//! Anthropic messages backend
//!
//! The system prompt travels as a top-level field and the completion text
//! lives at `content[0].text`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use scamguard_core::{Error, ProviderResponse, Result};
use serde_json::json;

use super::post_json;
use crate::classifier::ClassifierBackend;

const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 256;

pub struct AnthropicBackend {
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            client,
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| Error::config("API key contains invalid header characters"))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        Ok(headers)
    }
}

fn request_body(model: &str, system: &str, user: &str) -> serde_json::Value {
    json!({
        "model": model,
        "system": system,
        "max_tokens": MAX_TOKENS,
        "temperature": 0,
        "messages": [
            { "role": "user", "content": user }
        ]
    })
}

fn completion_text(envelope: &serde_json::Value) -> String {
    envelope
        .pointer("/content/0/text")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl ClassifierBackend for AnthropicBackend {
    async fn classify(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse> {
        let body = request_body(model, system_prompt, user_prompt);
        let envelope = post_json(&self.client, ANTHROPIC_ENDPOINT, self.headers()?, &body).await?;

        Ok(ProviderResponse::from_completion(completion_text(&envelope)))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
