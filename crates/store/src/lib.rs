//! Key-value store collaborator.
//!
//! The engine only ever uses per-key primitives: point get/put (optionally
//! version-checked), set membership, and bounded list operations. There is
//! no cross-key transaction in either backend; callers order their writes
//! instead.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Store key layout.
pub mod keys {
    /// Singleton server status record.
    pub const SERVER_STATUS: &str = "server:status";
    /// Set of player ids currently considered online.
    pub const ONLINE_PLAYERS: &str = "players:online";
    /// Global most-recent-first list of closed sessions.
    pub const RECENT_SESSIONS: &str = "sessions:recent";

    /// Per-player record key.
    pub fn player(id: &str) -> String {
        format!("player:{id}")
    }
}

/// Write generation of a record, for compare-and-swap updates.
pub type Version = u64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored value is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Per-key atomic store primitives.
///
/// Every method is atomic with respect to its own key; concurrent callers
/// never observe a torn value. Nothing stronger is promised.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read a single record.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write a single record unconditionally.
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Read a record together with its write version.
    async fn get_versioned(&self, key: &str) -> Result<Option<(Value, Version)>, StoreError>;

    /// Write a record only if its version still matches `expected`
    /// (`None` means the key must not exist yet). Returns false when the
    /// check fails and nothing was written.
    async fn put_if_version(
        &self,
        key: &str,
        value: Value,
        expected: Option<Version>,
    ) -> Result<bool, StoreError>;

    /// Add a member to a set. Idempotent.
    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// Remove a member from a set. Idempotent.
    async fn set_remove(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// All members of a set.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Push a value at the front of a list.
    async fn list_push_front(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Drop list entries beyond `len`, keeping the front.
    async fn list_trim(&self, key: &str, len: usize) -> Result<(), StoreError>;

    /// Up to `count` entries from the front of a list.
    async fn list_range(&self, key: &str, count: usize) -> Result<Vec<Value>, StoreError>;

    /// Bulk point reads; one slot per requested key, missing keys yield
    /// `None`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StoreError>;
}
