//! Mistral chat completions backend

use async_trait::async_trait;
use scamguard_core::{ProviderResponse, Result};

use super::openai::{chat_completion_text, chat_request_body};
use super::{bearer_headers, post_json};
use crate::classifier::ClassifierBackend;

const MISTRAL_ENDPOINT: &str = "https://api.mistral.ai/v1/chat/completions";

/// Mistral speaks the chat-completions dialect at a fixed endpoint
pub struct MistralBackend {
    api_key: String,
    client: reqwest::Client,
}

impl MistralBackend {
    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            client,
        }
    }
}

#[async_trait]
impl ClassifierBackend for MistralBackend {
    async fn classify(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse> {
        let body = chat_request_body(model, system_prompt, user_prompt);
        let envelope = post_json(
            &self.client,
            MISTRAL_ENDPOINT,
            bearer_headers(&self.api_key)?,
            &body,
        )
        .await?;

        Ok(ProviderResponse::from_completion(chat_completion_text(
            &envelope,
        )))
    }

    fn name(&self) -> &str {
        "mistral"
    }
}
