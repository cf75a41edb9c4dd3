// Sqlite Store
//
// Persistent backend. Records, set members, and list items live in three
// tables; every trait call is a single statement, which preserves the
// per-key atomicity the engine relies on. List order is kept by a
// per-key sequence number: higher seq = closer to the front.

use crate::{Store, StoreError, Version};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                 key     TEXT PRIMARY KEY,
                 value   TEXT NOT NULL,
                 version INTEGER NOT NULL DEFAULT 1
             );
             CREATE TABLE IF NOT EXISTS set_members (
                 key    TEXT NOT NULL,
                 member TEXT NOT NULL,
                 PRIMARY KEY (key, member)
             );
             CREATE TABLE IF NOT EXISTS list_items (
                 key   TEXT NOT NULL,
                 seq   INTEGER NOT NULL,
                 value TEXT NOT NULL,
                 PRIMARY KEY (key, seq)
             );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // a poisoning panic cannot leave a half-applied statement behind
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.lock();
        let text: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO kv (key, value, version) VALUES (?1, ?2, 1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, version = kv.version + 1",
            params![key, value.to_string()],
        )?;
        Ok(())
    }

    async fn get_versioned(&self, key: &str) -> Result<Option<(Value, Version)>, StoreError> {
        let conn = self.lock();
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT value, version FROM kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        match row {
            Some((text, version)) => Ok(Some((serde_json::from_str(&text)?, version as Version))),
            None => Ok(None),
        }
    }

    async fn put_if_version(
        &self,
        key: &str,
        value: Value,
        expected: Option<Version>,
    ) -> Result<bool, StoreError> {
        let conn = self.lock();
        let changed = match expected {
            Some(version) => conn.execute(
                "UPDATE kv SET value = ?2, version = version + 1
                 WHERE key = ?1 AND version = ?3",
                params![key, value.to_string(), version as i64],
            )?,
            None => conn.execute(
                "INSERT INTO kv (key, value, version) VALUES (?1, ?2, 1)
                 ON CONFLICT(key) DO NOTHING",
                params![key, value.to_string()],
            )?,
        };
        Ok(changed == 1)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR IGNORE INTO set_members (key, member) VALUES (?1, ?2)",
            params![key, member],
        )?;
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM set_members WHERE key = ?1 AND member = ?2",
            params![key, member],
        )?;
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT member FROM set_members WHERE key = ?1")?;
        let members = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(members)
    }

    async fn list_push_front(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO list_items (key, seq, value)
             VALUES (?1, COALESCE((SELECT MAX(seq) + 1 FROM list_items WHERE key = ?1), 0), ?2)",
            params![key, value.to_string()],
        )?;
        Ok(())
    }

    async fn list_trim(&self, key: &str, len: usize) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM list_items
             WHERE key = ?1
               AND seq NOT IN (
                   SELECT seq FROM list_items WHERE key = ?1
                   ORDER BY seq DESC LIMIT ?2
               )",
            params![key, len as i64],
        )?;
        Ok(())
    }

    async fn list_range(&self, key: &str, count: usize) -> Result<Vec<Value>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT value FROM list_items WHERE key = ?1 ORDER BY seq DESC LIMIT ?2",
        )?;
        let texts = stmt
            .query_map(params![key, count as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, _>>()?;
        texts
            .iter()
            .map(|text| serde_json::from_str(text).map_err(StoreError::from))
            .collect()
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let text: Option<String> = stmt
                .query_row(params![key], |row| row.get(0))
                .optional()?;
            out.push(match text {
                Some(text) => Some(serde_json::from_str(&text)?),
                None => None,
            });
        }
        Ok(out)
    }
}
