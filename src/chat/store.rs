use std::sync::Mutex;

use anyhow::Result;
use rusqlite::Connection;

use super::{ChatMessage, ChatRole};

/// SQLite-backed chat transcripts, one per session id.
pub struct ChatStore {
    conn: Mutex<Connection>,
}

impl ChatStore {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS chat_messages_session
                ON chat_messages (session_id, id);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    pub fn append(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO chat_messages (session_id, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            [
                session_id,
                message.role.as_str(),
                &message.content,
                &message.timestamp,
            ],
        )?;
        Ok(())
    }

    /// Messages of a session, oldest first.
    pub fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT role, content, timestamp FROM chat_messages
             WHERE session_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([session_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(role, content, timestamp)| {
                Ok(ChatMessage {
                    role: role.parse::<ChatRole>()?,
                    content,
                    timestamp,
                })
            })
            .collect()
    }

    /// Keep only the newest `keep` messages of a session.
    pub fn trim(&self, session_id: &str, keep: usize) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM chat_messages
             WHERE session_id = ?1 AND id NOT IN (
                SELECT id FROM chat_messages WHERE session_id = ?1
                ORDER BY id DESC LIMIT ?2
             )",
            rusqlite::params![session_id, keep as i64],
        )?;
        Ok(())
    }

    pub fn clear(&self, session_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM chat_messages WHERE session_id = ?1",
            [session_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
            timestamp: "2025-06-21T10:00:00".to_string(),
        }
    }

    #[test]
    fn append_and_history_in_order() {
        let store = ChatStore::in_memory().unwrap();
        store.append("s1", &msg(ChatRole::User, "hi")).unwrap();
        store.append("s1", &msg(ChatRole::Assistant, "hello")).unwrap();

        let history = store.history("s1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].content, "hello");
    }

    #[test]
    fn sessions_are_isolated() {
        let store = ChatStore::in_memory().unwrap();
        store.append("a", &msg(ChatRole::User, "one")).unwrap();
        store.append("b", &msg(ChatRole::User, "two")).unwrap();

        assert_eq!(store.history("a").unwrap().len(), 1);
        store.clear("a").unwrap();
        assert!(store.history("a").unwrap().is_empty());
        assert_eq!(store.history("b").unwrap().len(), 1);
    }

    #[test]
    fn trim_keeps_newest() {
        let store = ChatStore::in_memory().unwrap();
        for i in 0..10 {
            store.append("s", &msg(ChatRole::User, &i.to_string())).unwrap();
        }
        store.append("other", &msg(ChatRole::User, "x")).unwrap();

        store.trim("s", 4).unwrap();
        let contents: Vec<_> = store
            .history("s")
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["6", "7", "8", "9"]);
        assert_eq!(store.history("other").unwrap().len(), 1);
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.db");
        let path = path.to_str().unwrap();

        ChatStore::new(path)
            .unwrap()
            .append("s", &msg(ChatRole::User, "kept"))
            .unwrap();
        assert_eq!(ChatStore::new(path).unwrap().history("s").unwrap()[0].content, "kept");
    }
}
