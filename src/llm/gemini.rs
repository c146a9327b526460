//! Google Gemini client over the streaming `streamGenerateContent` endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, info};

use super::sse::SseDecoder;
use super::{Completion, Content, Llm, Model, TokenUsage};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Longest slice of an error body echoed back in error messages.
const ERROR_BODY_LIMIT: usize = 500;

/// An [`Llm`] backed by the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

impl GeminiClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("Gemini API key is required");
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
        })
    }

    /// Tokens spent by every call made through this client so far.
    pub fn session_usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
        }
    }

    pub fn build_request_body(contents: &[Content]) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = contents
            .iter()
            .map(|c| {
                serde_json::json!({
                    "role": c.role.as_str(),
                    "parts": [{ "text": c.text }],
                })
            })
            .collect();

        serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "thinkingConfig": {
                    "thinkingBudget": -1,
                    "includeThoughts": true
                },
                "responseMimeType": "text/plain"
            }
        })
    }

    fn stream_url(&self, model: Model) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url,
            model.id()
        )
    }

    fn record_usage(&self, usage: TokenUsage) {
        self.input_tokens
            .fetch_add(usage.input_tokens, Ordering::Relaxed);
        self.output_tokens
            .fetch_add(usage.output_tokens, Ordering::Relaxed);
    }
}

#[async_trait]
impl Llm for GeminiClient {
    async fn generate(&self, model: Model, contents: &[Content]) -> Result<Completion> {
        let body = Self::build_request_body(contents);
        let prompt_chars: usize = contents.iter().map(|c| c.text.len()).sum();
        info!(model = %model, prompt_chars, "calling Gemini");

        let resp = self
            .client
            .post(self.stream_url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("Gemini API error ({}): {}", status, truncate(&text, ERROR_BODY_LIMIT));
        }

        let mut stream = resp.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut response = StreamResponse::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("failed reading Gemini response stream")?;
            for data in decoder.push(&chunk) {
                response.absorb(&data)?;
            }
        }
        if let Some(data) = decoder.finish() {
            response.absorb(&data)?;
        }

        if response.text.is_empty() {
            bail!("Gemini API returned empty response");
        }

        if let Some(usage) = response.usage {
            debug!(
                input = usage.input_tokens,
                output = usage.output_tokens,
                "Gemini token usage"
            );
            self.record_usage(usage);
        }

        Ok(Completion {
            text: response.text,
            usage: response.usage,
        })
    }
}

/// Accumulates streamed chunks into the final text.
#[derive(Debug, Default)]
struct StreamResponse {
    text: String,
    usage: Option<TokenUsage>,
}

impl StreamResponse {
    fn absorb(&mut self, data: &str) -> Result<()> {
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return Ok(());
        }

        let chunk: StreamChunk = serde_json::from_str(data)
            .with_context(|| format!("malformed Gemini stream chunk: {}", truncate(data, 200)))?;

        if let Some(error) = chunk.error {
            bail!("Gemini API error: {}", error.message);
        }

        for candidate in &chunk.candidates {
            let Some(content) = &candidate.content else {
                continue;
            };
            for part in &content.parts {
                if part.thought.unwrap_or(false) {
                    continue;
                }
                if let Some(text) = &part.text {
                    self.text.push_str(text);
                }
            }
        }

        // The last chunk carries the totals for the whole call.
        if let Some(meta) = chunk.usage_metadata {
            self.usage = Some(TokenUsage {
                input_tokens: meta.prompt_token_count.unwrap_or(0),
                output_tokens: meta.candidates_token_count.unwrap_or(0)
                    + meta.thoughts_token_count.unwrap_or(0),
            });
        }

        Ok(())
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// --- API types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    thought: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    thoughts_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
