//! Hugging Face inference endpoint backend
//!
//! Text-generation models take a single prompt, so the system and user
//! prompts are concatenated. The endpoint answers either
//! `[{"generated_text": "..."}]` or `{"generated_text": "..."}`.

use async_trait::async_trait;
use scamguard_core::{ProviderResponse, Result};
use serde_json::json;

use super::{bearer_headers, post_json};
use crate::classifier::ClassifierBackend;

const INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";
const MAX_NEW_TOKENS: u32 = 300;

pub struct HuggingFaceBackend {
    api_key: String,
    client: reqwest::Client,
}

impl HuggingFaceBackend {
    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            client,
        }
    }
}

fn request_body(system: &str, user: &str) -> serde_json::Value {
    let prompt = format!(
        "{}\n\nUser:\n{}\n\nReturn ONLY a compact JSON object.",
        system, user
    );
    json!({
        "inputs": prompt,
        "parameters": {
            "max_new_tokens": MAX_NEW_TOKENS,
            "temperature": 0,
            "return_full_text": false
        }
    })
}

fn generated_text(envelope: &serde_json::Value) -> String {
    let text = match envelope {
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|item| item.get("generated_text"))
            .and_then(|t| t.as_str()),
        other => other.get("generated_text").and_then(|t| t.as_str()),
    };

    match text {
        Some(text) => text.to_string(),
        None => envelope.to_string(),
    }
}

#[async_trait]
impl ClassifierBackend for HuggingFaceBackend {
    async fn classify(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse> {
        let url = format!("{}/{}", INFERENCE_BASE_URL, model.trim_matches('/'));
        let body = request_body(system_prompt, user_prompt);
        let envelope = post_json(&self.client, &url, bearer_headers(&self.api_key)?, &body).await?;

        Ok(ProviderResponse::from_completion(generated_text(&envelope)))
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}
