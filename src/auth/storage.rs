//! Saved API keys, one per provider, in the shared counsel database.

use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

/// A key saved with `counsel login`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredKey {
    pub key: String,
    pub saved_at: DateTime<Utc>,
}

/// A usable key and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Stored(String),
    Env(String),
}

impl KeySource {
    pub fn key(&self) -> &str {
        match self {
            Self::Stored(key) | Self::Env(key) => key,
        }
    }
}

/// API key table living beside `Config` and the chat log.
pub struct AuthStorage {
    conn: Mutex<Connection>,
}

impl AuthStorage {
    /// Open the database at `path` (`":memory:"` in tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS api_keys (
                provider TEXT PRIMARY KEY,
                key      TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn stored(&self, provider: &str) -> Result<Option<StoredKey>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT key, saved_at FROM api_keys WHERE provider = ?1",
                [provider],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(key, saved_at)| {
            let saved_at = DateTime::parse_from_rfc3339(&saved_at)
                .with_context(|| format!("bad saved_at for {provider}: {saved_at}"))?
                .with_timezone(&Utc);
            Ok(StoredKey { key, saved_at })
        })
        .transpose()
    }

    /// Save `key` for `provider`, replacing any earlier one.
    pub fn save(&self, provider: &str, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO api_keys (provider, key, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(provider) DO UPDATE
             SET key = excluded.key, saved_at = excluded.saved_at",
            params![provider, key, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Delete the saved key. Returns whether there was one.
    pub fn forget(&self, provider: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM api_keys WHERE provider = ?1", [provider])?;
        Ok(removed > 0)
    }

    /// The saved key, else a non-empty `env_var`.
    pub fn resolve(&self, provider: &str, env_var: &str) -> Result<Option<KeySource>> {
        if let Some(stored) = self.stored(provider)? {
            return Ok(Some(KeySource::Stored(stored.key)));
        }
        Ok(std::env::var(env_var)
            .ok()
            .filter(|key| !key.is_empty())
            .map(KeySource::Env))
    }
}
