//! Classifier backend trait and provider selection

use async_trait::async_trait;
use scamguard_core::{Error, ProviderResponse, Result};
use std::fmt;
use std::str::FromStr;

/// Trait for all external classification backends
///
/// An adapter only marshals the request into its backend's wire format and
/// unwraps the completion text back into a [`ProviderResponse`]. Parsing the
/// text as JSON is attempted but may fail; that is not an error.
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    /// Classify a message given the system and user prompts
    async fn classify(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Known classifier backends, selected by configured name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Groq,
    Xai,
    HuggingFaceRouter,
    Anthropic,
    Mistral,
    HuggingFace,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::Xai => "xai",
            Self::HuggingFaceRouter => "huggingface_router",
            Self::Anthropic => "anthropic",
            Self::Mistral => "mistral",
            Self::HuggingFace => "huggingface",
        }
    }

    /// Environment variable holding this backend's credential
    pub fn credential_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::Xai => "XAI_API_KEY",
            Self::HuggingFaceRouter | Self::HuggingFace => "HUGGINGFACE_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Mistral => "MISTRAL_API_KEY",
        }
    }

    /// Whether the backend speaks the OpenAI chat-completions dialect
    pub fn is_openai_compatible(&self) -> bool {
        matches!(
            self,
            Self::OpenAi | Self::Groq | Self::Xai | Self::HuggingFaceRouter
        )
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            "xai" => Ok(Self::Xai),
            "huggingface_router" | "hf_router" => Ok(Self::HuggingFaceRouter),
            "anthropic" => Ok(Self::Anthropic),
            "mistral" => Ok(Self::Mistral),
            "huggingface" => Ok(Self::HuggingFace),
            other => Err(Error::config(format!("Unknown provider: {}", other))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
