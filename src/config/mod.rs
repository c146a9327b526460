//! Key-value configuration storage backed by SQLite, plus the resolved
//! [`Settings`] every command runs with.
//!
//! Shares a database with [`AuthStorage`](crate::auth::AuthStorage) and
//! [`ChatStore`](crate::chat::store::ChatStore). Pass the same path to
//! all three.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;

use crate::consts::{
    DEFAULT_CASES_DIR, DEFAULT_CONCURRENCY, DEFAULT_INDEX_PATH, DEFAULT_TIMEOUT_SECS,
    DEFAULT_TOP_N,
};
use crate::llm::Model;
use crate::llm::gemini::DEFAULT_BASE_URL;

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get a config value by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Set a config value (upsert).
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a config key.
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }

    /// All stored pairs, ordered by key.
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key, value FROM config ORDER BY key ASC")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    }
}

/// Keys understood by [`Settings::load`].
pub const KNOWN_KEYS: &[&str] = &[
    "model.ranking",
    "model.summary",
    "model.report",
    "model.chat",
    "cases.dir",
    "cases.index",
    "output.dir",
    "research.top_n",
    "llm.concurrency",
    "llm.timeout_secs",
    "llm.base_url",
];

/// Everything a command needs to know, resolved from stored config and
/// built-in defaults. CLI flags override individual fields afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub cases_dir: PathBuf,
    pub index_path: PathBuf,
    pub output_dir: PathBuf,
    pub ranking_model: Model,
    pub summary_model: Model,
    pub report_model: Model,
    pub chat_model: Model,
    pub top_n: usize,
    pub concurrency: usize,
    pub timeout: Duration,
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cases_dir: PathBuf::from(DEFAULT_CASES_DIR),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            output_dir: PathBuf::from("."),
            ranking_model: Model::Pro,
            summary_model: Model::FlashLite,
            report_model: Model::Pro,
            chat_model: Model::Flash,
            top_n: DEFAULT_TOP_N,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    /// Resolve settings: stored config first, defaults for the rest.
    pub fn load(config: &Config) -> Result<Self> {
        let mut settings = Self::default();
        for (key, value) in config.list()? {
            if KNOWN_KEYS.contains(&key.as_str()) {
                settings
                    .apply(&key, &value)
                    .with_context(|| format!("invalid stored config {key}={value}"))?;
            } else {
                tracing::warn!(key = %key, "ignoring unknown config key");
            }
        }
        Ok(settings)
    }

    /// Apply one `key=value` pair. Also used to validate `counsel config set`.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "model.ranking" => self.ranking_model = Model::from_str(value)?,
            "model.summary" => self.summary_model = Model::from_str(value)?,
            "model.report" => self.report_model = Model::from_str(value)?,
            "model.chat" => self.chat_model = Model::from_str(value)?,
            "cases.dir" => self.cases_dir = PathBuf::from(value),
            "cases.index" => self.index_path = PathBuf::from(value),
            "output.dir" => self.output_dir = PathBuf::from(value),
            "research.top_n" => self.top_n = parse_positive(value)?,
            "llm.concurrency" => self.concurrency = parse_positive(value)?,
            "llm.timeout_secs" => {
                self.timeout = Duration::from_secs(parse_positive(value)? as u64)
            }
            "llm.base_url" => self.base_url = value.trim_end_matches('/').to_string(),
            other => bail!("unknown config key: {other}"),
        }
        Ok(())
    }
}

fn parse_positive(value: &str) -> Result<usize> {
    let n: usize = value
        .trim()
        .parse()
        .with_context(|| format!("expected a positive integer, got {value:?}"))?;
    if n == 0 {
        bail!("expected a positive integer, got 0");
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_config() -> Config {
        Config::open(":memory:").unwrap()
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let config = mem_config();
        assert!(config.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn set_and_get() {
        let config = mem_config();
        config.set("model.report", "gemini-2.5-pro").unwrap();
        assert_eq!(config.get("model.report").unwrap().unwrap(), "gemini-2.5-pro");
    }

    #[test]
    fn set_overwrites_existing() {
        let config = mem_config();
        config.set("research.top_n", "4").unwrap();
        config.set("research.top_n", "6").unwrap();
        assert_eq!(config.get("research.top_n").unwrap().unwrap(), "6");
    }

    #[test]
    fn remove_deletes_key() {
        let config = mem_config();
        config.set("cases.dir", "/tmp/cases").unwrap();
        config.remove("cases.dir").unwrap();
        assert!(config.get("cases.dir").unwrap().is_none());
    }

    #[test]
    fn list_is_sorted_by_key() {
        let config = mem_config();
        config.set("output.dir", "out").unwrap();
        config.set("cases.dir", "cases").unwrap();
        let keys: Vec<_> = config.list().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["cases.dir", "output.dir"]);
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config-test.db");
        let path_str = path.to_str().unwrap();

        {
            let config = Config::open(path_str).unwrap();
            config.set("model.chat", "flash").unwrap();
        }

        {
            let config = Config::open(path_str).unwrap();
            assert_eq!(config.get("model.chat").unwrap().unwrap(), "flash");
        }
    }

    #[test]
    fn settings_defaults_without_config() {
        let settings = Settings::load(&mem_config()).unwrap();
        assert_eq!(settings.top_n, 8);
        assert_eq!(settings.concurrency, 16);
        assert_eq!(settings.ranking_model, Model::Pro);
        assert_eq!(settings.summary_model, Model::FlashLite);
        assert_eq!(settings.chat_model, Model::Flash);
    }

    #[test]
    fn settings_pick_up_stored_values() {
        let config = mem_config();
        config.set("research.top_n", "3").unwrap();
        config.set("model.report", "flash").unwrap();
        config.set("llm.base_url", "http://localhost:9999/").unwrap();

        let settings = Settings::load(&config).unwrap();
        assert_eq!(settings.top_n, 3);
        assert_eq!(settings.report_model, Model::Flash);
        assert_eq!(settings.base_url, "http://localhost:9999");
    }

    #[test]
    fn settings_reject_bad_stored_value() {
        let config = mem_config();
        config.set("research.top_n", "zero").unwrap();
        assert!(Settings::load(&config).is_err());
    }

    #[test]
    fn settings_ignore_unknown_keys() {
        let config = mem_config();
        config.set("theme", "dark").unwrap();
        assert!(Settings::load(&config).is_ok());
    }

    #[test]
    fn apply_rejects_zero_and_unknown_key() {
        let mut settings = Settings::default();
        assert!(settings.apply("llm.concurrency", "0").is_err());
        assert!(settings.apply("nope", "1").is_err());
    }
}
