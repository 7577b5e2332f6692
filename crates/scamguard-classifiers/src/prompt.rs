//! Prompt builder
//!
//! Deterministic, side-effect free transformation of a message plus few-shot
//! examples into the system and user prompts sent to a classifier backend.

use regex::Regex;
use scamguard_core::{Error, LabeledExample, Result};
use std::collections::BTreeSet;

const RESPONSE_SCHEMA: &str = r#"You are a security classifier. Output ONLY valid JSON matching:
{
  "is_scam": boolean,
  "confidence": number,
  "reasons": string[],
  "tags": string[],
  "risk_factors": {
    "impersonation"?: number,
    "off_platform"?: number,
    "credential_theft"?: number,
    "malware_link"?: number
  }
}"#;

const SCAM_INDICATORS: [&str; 5] = [
    "- Requests for DMs, off-platform contacts, wallets, seeds, private keys.",
    "- Fake giveaways/airdrops, Nitro scams, payment/billing links.",
    "- Urgency, push to bypass moderators, or impersonation.",
    "- Links to suspicious domains or URL shorteners.",
    "- Language patterns indicative of social engineering.",
];

/// Prompts for one classification call
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,

    /// Unique links found in the message, sorted
    pub links: Vec<String>,
}

/// Builds classifier prompts
pub struct PromptBuilder {
    url_regex: Regex,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new() -> Result<Self> {
        Ok(Self {
            url_regex: Regex::new(r"(?i)\bhttps?://[^\s]+")
                .map_err(|e| Error::internal(format!("Failed to compile URL regex: {}", e)))?,
        })
    }

    /// Unique links in `text`, lexicographically sorted
    pub fn extract_links(&self, text: &str) -> Vec<String> {
        self.url_regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// System prompt: response schema, rubric, and rendered few-shot examples
    pub fn system_prompt(&self, examples: &[LabeledExample]) -> String {
        let rendered = examples
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let ctx = e
                    .meta
                    .author_age_days
                    .map(|days| format!(" (author_age_days={})", days))
                    .unwrap_or_default();
                format!(
                    "Example {} [{}]{}:\n{}\nReason: {}",
                    i + 1,
                    e.label.as_str().to_uppercase(),
                    ctx,
                    e.content,
                    e.reason.as_deref().unwrap_or("n/a")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let few_shot = if rendered.is_empty() {
            "(no examples provided)".to_string()
        } else {
            rendered
        };

        [
            RESPONSE_SCHEMA.to_string(),
            "Be conservative: only mark true when signals are clear. Prefer false if ambiguous."
                .to_string(),
            "Do not include code fences or commentary. Return JSON only.".to_string(),
            String::new(),
            "Scam indicators:".to_string(),
            SCAM_INDICATORS.join("\n"),
            String::new(),
            "Few-shot guidance:".to_string(),
            few_shot,
        ]
        .join("\n")
    }

    /// User prompt: message content, author age, and links
    pub fn user_prompt(&self, content: &str, author_age_days: Option<i64>, links: &[String]) -> String {
        let age = author_age_days
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let links = if links.is_empty() {
            "none".to_string()
        } else {
            links.join(", ")
        };

        format!(
            "Message: \"\"\"{}\"\"\"\nAuthorAgeDays: {}\nLinks: {}",
            content, age, links
        )
    }

    /// Build both prompts for a message
    pub fn build(
        &self,
        content: &str,
        author_age_days: Option<i64>,
        examples: &[LabeledExample],
    ) -> Prompt {
        let links = self.extract_links(content);
        Prompt {
            system: self.system_prompt(examples),
            user: self.user_prompt(content, author_age_days, &links),
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scamguard_core::{ExampleMeta, Label};

    #[test]
    fn test_extract_links_dedup_sorted_case_insensitive() {
        let builder = PromptBuilder::new().unwrap();
        let links = builder.extract_links(
            "claim at HTTPS://b.example/x and https://a.example then https://a.example again",
        );
        assert_eq!(links, vec!["HTTPS://b.example/x", "https://a.example"]);
        assert!(builder.extract_links("no links, just www.example.com").is_empty());
    }

    #[test]
    fn test_system_prompt_renders_examples() {
        let builder = PromptBuilder::new().unwrap();
        let examples = vec![
            LabeledExample::new("free nitro here", Label::Scam)
                .with_reason("nitro bait")
                .with_meta(ExampleMeta {
                    author_age_days: Some(2),
                    ..Default::default()
                }),
            LabeledExample::new("see you at the raid", Label::NotScam),
        ];

        let prompt = builder.system_prompt(&examples);
        assert!(prompt.contains("Example 1 [SCAM] (author_age_days=2):\nfree nitro here\nReason: nitro bait"));
        assert!(prompt.contains("Example 2 [NOT_SCAM]:\nsee you at the raid\nReason: n/a"));
        assert!(prompt.contains("Scam indicators:"));
    }

    #[test]
    fn test_system_prompt_without_examples() {
        let prompt = PromptBuilder::new().unwrap().system_prompt(&[]);
        assert!(prompt.ends_with("Few-shot guidance:\n(no examples provided)"));
    }

    #[test]
    fn test_user_prompt_is_deterministic() {
        let builder = PromptBuilder::new().unwrap();
        let a = builder.build("go to https://z.io and https://a.io", Some(3), &[]);
        let b = builder.build("go to https://z.io and https://a.io", Some(3), &[]);
        assert_eq!(a, b);
        assert_eq!(
            a.user,
            "Message: \"\"\"go to https://z.io and https://a.io\"\"\"\nAuthorAgeDays: 3\nLinks: https://a.io, https://z.io"
        );

        let unknown = builder.user_prompt("hi", None, &[]);
        assert!(unknown.ends_with("AuthorAgeDays: unknown\nLinks: none"));
    }
}
