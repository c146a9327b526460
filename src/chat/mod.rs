pub mod store;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::{Content, Llm, Model};
use crate::prompts::chat::{ACKNOWLEDGEMENT, APOLOGY, SYSTEM_PROMPT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => bail!("unknown chat role: {other}"),
        }
    }
}

/// One entry of a chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Local time, ISO-8601.
    pub timestamp: String,
}

impl ChatMessage {
    pub fn now(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: now_iso(),
        }
    }
}

/// Current local time as `YYYY-MM-DDTHH:MM:SS.ffffff`.
pub fn now_iso() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// The arbitration co-counsel persona over a chat model.
pub struct CoCounsel {
    llm: Arc<dyn Llm>,
    model: Model,
}

impl CoCounsel {
    pub fn new(llm: Arc<dyn Llm>, model: Model) -> Self {
        Self { llm, model }
    }

    /// Persona priming, then the transcript, then the new message.
    pub fn build_contents(history: &[ChatMessage], message: &str) -> Vec<Content> {
        let mut contents = Vec::with_capacity(history.len() + 3);
        contents.push(Content::user(SYSTEM_PROMPT));
        contents.push(Content::model(ACKNOWLEDGEMENT));
        for entry in history {
            contents.push(match entry.role {
                ChatRole::User => Content::user(&entry.content),
                ChatRole::Assistant => Content::model(&entry.content),
            });
        }
        contents.push(Content::user(message));
        contents
    }

    /// Reply to `message`. Model failures come back as an apology so the
    /// conversation can continue.
    pub async fn respond(&self, history: &[ChatMessage], message: &str) -> String {
        let contents = Self::build_contents(history, message);
        match self.llm.generate(self.model, &contents).await {
            Ok(completion) => completion.text,
            Err(e) => {
                warn!(error = %e, "chat model call failed");
                format!("{APOLOGY}{e}")
            }
        }
    }
}
