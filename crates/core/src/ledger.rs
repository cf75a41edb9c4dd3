// Per-Player Session Accounting
//
// A player's durable record: identity, presence state, bounded session
// history, and lifetime aggregates. Operations take the current time as a
// parameter; nothing here reads a clock or performs I/O.

use crate::history::RecentLog;
use serde::{Deserialize, Serialize};

/// Closed sessions kept per player. Older closes fall out of the history;
/// the lifetime aggregates keep counting.
pub const SESSION_HISTORY_LIMIT: usize = 50;

/// One closed play interval. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub player_id: String,
    /// Display name at close time.
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub duration_ms: i64,
}

/// Durable per-player record.
///
/// Created lazily on a player's first observed join and never expired.
/// Only `session_start` (and the online-set membership derived from it)
/// is transient; everything else grows monotonically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub player_id: String,
    /// Most recently observed display name.
    pub name: String,
    pub last_seen: i64,
    /// Present iff the player is currently considered online.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_start: Option<i64>,
    #[serde(default)]
    pub sessions: RecentLog<SessionRecord, SESSION_HISTORY_LIMIT>,
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub total_play_ms: i64,
}

impl PlayerRecord {
    pub fn new(player_id: impl Into<String>, name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            player_id: player_id.into(),
            name: name.into(),
            last_seen: now_ms,
            session_start: None,
            sessions: RecentLog::new(),
            total_sessions: 0,
            total_play_ms: 0,
        }
    }

    /// Mark the player online and open a session window.
    ///
    /// A stale `session_start` left behind by an interrupted cycle is
    /// overwritten; the unclosed interval cannot be reconstructed and the
    /// new observation wins.
    pub fn open_session(&mut self, name: &str, now_ms: i64) {
        self.name = name.to_string();
        self.last_seen = now_ms;
        self.session_start = Some(now_ms);
    }

    /// Refresh visibility without touching the session window. Idempotent
    /// within a cycle.
    pub fn refresh(&mut self, name: &str, now_ms: i64) {
        self.name = name.to_string();
        self.last_seen = now_ms;
    }

    /// Close the open session, if any, and fold it into the aggregates.
    ///
    /// Returns `None` when there is no open window; a leave observed
    /// without a prior join records nothing.
    pub fn close_session(&mut self, now_ms: i64) -> Option<SessionRecord> {
        let start = self.session_start.take()?;
        let duration_ms = (now_ms - start).max(0);
        let record = SessionRecord {
            player_id: self.player_id.clone(),
            name: self.name.clone(),
            start,
            end: now_ms,
            duration_ms,
        };

        self.sessions.push(record.clone());
        self.total_sessions += 1;
        self.total_play_ms += duration_ms;
        self.last_seen = now_ms;

        Some(record)
    }

    pub fn is_online(&self) -> bool {
        self.session_start.is_some()
    }
}
