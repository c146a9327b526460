use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::{Completion, Content, Llm, Model, TokenUsage};

/// A scripted model for tests.
///
/// Rules match on a substring of the last user turn and win over the
/// queue, so concurrent callers get stable answers regardless of
/// scheduling. Everything else pops the queue in order.
pub struct MockLlm {
    rules: Vec<(String, Reply)>,
    queue: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<MockCall>>,
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// What the mock was asked.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub model: Model,
    pub contents: Vec<Content>,
}

impl MockCall {
    /// Text of the final turn.
    pub fn prompt(&self) -> &str {
        self.contents.last().map(|c| c.text.as_str()).unwrap_or("")
    }
}

impl MockLlm {
    /// Reply with `responses` in order.
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            rules: Vec::new(),
            queue: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| Reply::Text(r.into()))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `response` whenever the prompt contains `needle`.
    pub fn when(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules
            .push((needle.into(), Reply::Text(response.into())));
        self
    }

    /// Fail whenever the prompt contains `needle`.
    pub fn fail_when(mut self, needle: impl Into<String>, error: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Fail(error.into())));
        self
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Llm for MockLlm {
    async fn generate(&self, model: Model, contents: &[Content]) -> Result<Completion> {
        let call = MockCall {
            model,
            contents: contents.to_vec(),
        };
        let prompt = call.prompt().to_string();
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len()
        };

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.queue.lock().unwrap().pop_front())
            .ok_or_else(|| anyhow::anyhow!("MockLlm: no more responses (called {} times)", n))?;

        match reply {
            Reply::Text(text) => Ok(Completion {
                usage: Some(TokenUsage {
                    input_tokens: prompt.len() as u64,
                    output_tokens: text.len() as u64,
                }),
                text,
            }),
            Reply::Fail(error) => Err(anyhow::anyhow!(error)),
        }
    }
}
