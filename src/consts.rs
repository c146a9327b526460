//! Project-wide constants.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Environment variable consulted when no API key is stored.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Credential slot used by `counsel login`.
pub const PROVIDER: &str = "gemini";

/// Directory holding one `<case_id>.json` file per case.
pub const DEFAULT_CASES_DIR: &str = "data/jus_mundi_hackathon_data/cases";

/// CSV index produced by `counsel index`.
pub const DEFAULT_INDEX_PATH: &str = "cases.csv";

/// Number of cases the ranking step asks for.
pub const DEFAULT_TOP_N: usize = 8;

/// Maximum concurrent decision summaries in flight.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Per-request timeout for LLM calls. Pro reports can take minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Chat history entries kept per session (20 exchanges).
pub const CHAT_HISTORY_LIMIT: usize = 40;

/// Default database path: `~/.counsel/counsel.db`.
/// Single DB for config, credentials and chat sessions.
pub fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".counsel").join("counsel.db"))
}

/// Format a number with comma separators (e.g. 1,234,567).
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
