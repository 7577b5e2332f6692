//! OpenAI-compatible chat completions backend
//!
//! Request:
//! ```text
//! POST {base}/chat/completions
//! {"model": "...", "response_format": {"type": "json_object"}, "temperature": 0,
//!  "messages": [{"role": "system", ...}, {"role": "user", ...}]}
//! ```
//! The completion text lives at `choices[0].message.content`.

use async_trait::async_trait;
use scamguard_core::{ProviderResponse, Result};
use serde_json::json;

use super::{bearer_headers, post_json};
use crate::classifier::ClassifierBackend;

/// Backend for any endpoint speaking the OpenAI chat-completions dialect
pub struct OpenAiCompatibleBackend {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Chat-completions request body in JSON mode
pub(crate) fn chat_request_body(model: &str, system: &str, user: &str) -> serde_json::Value {
    json!({
        "model": model,
        "response_format": { "type": "json_object" },
        "temperature": 0,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": user }
        ]
    })
}

/// Extract `choices[0].message.content`, empty when absent
pub(crate) fn chat_completion_text(envelope: &serde_json::Value) -> String {
    envelope
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl ClassifierBackend for OpenAiCompatibleBackend {
    async fn classify(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse> {
        let body = chat_request_body(model, system_prompt, user_prompt);
        let envelope = post_json(
            &self.client,
            &self.endpoint(),
            bearer_headers(&self.api_key)?,
            &body,
        )
        .await?;

        Ok(ProviderResponse::from_completion(chat_completion_text(
            &envelope,
        )))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
