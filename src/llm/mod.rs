pub mod gemini;
pub mod mock;
pub mod sse;

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// The Gemini models the research pipeline and chat use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    Pro,
    Flash,
    FlashLite,
}

impl Model {
    /// API model id.
    pub fn id(&self) -> &'static str {
        match self {
            Model::Pro => "gemini-2.5-pro",
            Model::Flash => "gemini-2.5-flash",
            Model::FlashLite => "gemini-2.5-flash-lite-preview-06-17",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = anyhow::Error;

    /// Accepts the full model id or the short names `pro`, `flash`, `flash-lite`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        for model in [Model::Pro, Model::Flash, Model::FlashLite] {
            if s == model.id() {
                return Ok(model);
            }
        }
        match s.to_ascii_lowercase().as_str() {
            "pro" => Ok(Model::Pro),
            "flash" => Ok(Model::Flash),
            "flash-lite" | "flash_lite" | "lite" => Ok(Model::FlashLite),
            _ => bail!("unknown model: {s}"),
        }
    }
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One conversation turn sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub role: Role,
    pub text: String,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Token usage from a single LLM call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another usage into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Total tokens (input + output).
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// The generated text plus optional token usage.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Anything that turns a conversation into text: the Gemini API or a test script.
#[async_trait]
pub trait Llm: Send + Sync {
    async fn generate(&self, model: Model, contents: &[Content]) -> Result<Completion>;
}

/// Stands in for a model that cannot be reached; every call fails.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Llm for Unavailable {
    async fn generate(&self, _model: Model, _contents: &[Content]) -> Result<Completion> {
        bail!("{}", self.reason)
    }
}

/// Send a single user prompt and return the response text.
pub async fn ask(llm: &dyn Llm, model: Model, prompt: &str) -> Result<String> {
    let completion = llm.generate(model, &[Content::user(prompt)]).await?;
    Ok(completion.text)
}

/// Send a prompt whose answer ends in a JSON block and deserialize it.
pub async fn ask_json<T: DeserializeOwned>(llm: &dyn Llm, model: Model, prompt: &str) -> Result<T> {
    let response = ask(llm, model, prompt).await?;
    parse_json(&response)
}

/// Deserialize the JSON payload of a model response.
pub fn parse_json<T: DeserializeOwned>(response: &str) -> Result<T> {
    let json = extract_json(response);
    serde_json::from_str(json).map_err(|e| {
        tracing::error!(json = %json, "failed to parse JSON from model response");
        anyhow::anyhow!("failed to parse model response as JSON: {e}\nraw: {json}")
    })
}

/// Extract the first ```` ```json ```` fenced block anywhere in the text,
/// or the whole trimmed text when there is none.
pub fn extract_json(text: &str) -> &str {
    const FENCE: &str = "```json";

    if let Some(start) = text.find(FENCE) {
        let body = &text[start + FENCE.len()..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_fails_with_reason() {
        let llm = Unavailable::new("no API key");
        let err = ask(&llm, Model::Flash, "hello").await.unwrap_err();
        assert_eq!(err.to_string(), "no API key");
    }

    #[test]
    fn model_ids() {
        assert_eq!(Model::Pro.id(), "gemini-2.5-pro");
        assert_eq!(Model::Flash.id(), "gemini-2.5-flash");
        assert_eq!(Model::FlashLite.id(), "gemini-2.5-flash-lite-preview-06-17");
    }

    #[test]
    fn model_parses_ids_and_short_names() {
        assert_eq!("gemini-2.5-pro".parse::<Model>().unwrap(), Model::Pro);
        assert_eq!("flash".parse::<Model>().unwrap(), Model::Flash);
        assert_eq!("Flash-Lite".parse::<Model>().unwrap(), Model::FlashLite);
        assert!("gpt-4".parse::<Model>().is_err());
    }

    #[test]
    fn token_usage_accumulates() {
        let mut usage = TokenUsage::default();
        usage.add(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        });
        usage.add(TokenUsage {
            input_tokens: 1,
            output_tokens: 2,
        });
        assert_eq!(usage.total(), 18);
    }

    #[test]
    fn extract_json_plain() {
        assert_eq!(extract_json(r#"["1", "2"]"#), r#"["1", "2"]"#);
    }

    #[test]
    fn extract_json_after_prose() {
        let text = "Reasoning about cases...\n\n```json\n[\"502\", \"77\"]\n```\nThat's all.";
        assert_eq!(extract_json(text), r#"["502", "77"]"#);
    }

    #[test]
    fn extract_json_takes_first_block() {
        let text = "```json\n[1]\n```\nand\n```json\n[2]\n```";
        assert_eq!(extract_json(text), "[1]");
    }

    #[test]
    fn extract_json_unclosed_fence_returns_trimmed_text() {
        let text = "  ```json\n[1]  ";
        assert_eq!(extract_json(text), "```json\n[1]");
    }

    #[test]
    fn parse_json_reports_raw_text() {
        let err = parse_json::<Vec<String>>("no json here").unwrap_err();
        assert!(err.to_string().contains("no json here"));
    }

    #[test]
    fn parse_json_list_of_ids() {
        let ids: Vec<String> = parse_json("```json\n[\"a\", \"b\"]\n```").unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
