// Status Projection
//
// Read-path assembly of the current view: server status, the players
// currently online with their aggregates, and the recent session feed.
// Never mutates anything; an empty store projects to sane defaults.

use roster_core::{PlayerRecord, ServerStatus, SessionRecord};
use roster_store::{keys, Store, StoreError};
use serde::Serialize;

/// Recent sessions surfaced by the read endpoint.
pub const RECENT_REPORT_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlinePlayer {
    pub id: String,
    pub name: String,
    pub last_seen: i64,
    pub online: bool,
    pub total_sessions: u64,
    pub total_play_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub ok: bool,
    pub server: ServerStatus,
    pub online_players: Vec<OnlinePlayer>,
    pub recent_sessions: Vec<SessionRecord>,
}

/// Assemble the read view.
///
/// Online-set members whose record cannot be resolved are dropped rather
/// than surfaced as errors; the set and the records have no cross-key
/// consistency guarantee to lean on.
pub async fn project_status(store: &dyn Store) -> Result<StatusReport, StoreError> {
    let server = store
        .get(keys::SERVER_STATUS)
        .await?
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_else(ServerStatus::default);

    let member_ids = store.set_members(keys::ONLINE_PLAYERS).await?;
    let record_keys: Vec<String> = member_ids.iter().map(|id| keys::player(id)).collect();

    let mut online_players = Vec::new();
    if !record_keys.is_empty() {
        for value in store.get_many(&record_keys).await?.into_iter().flatten() {
            let Ok(record) = serde_json::from_value::<PlayerRecord>(value) else {
                continue;
            };
            online_players.push(OnlinePlayer {
                id: record.player_id,
                name: record.name,
                last_seen: record.last_seen,
                online: true,
                total_sessions: record.total_sessions,
                total_play_ms: record.total_play_ms,
            });
        }
    }

    let recent_sessions = store
        .list_range(keys::RECENT_SESSIONS, RECENT_REPORT_LIMIT)
        .await?
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();

    Ok(StatusReport {
        ok: true,
        server,
        online_players,
        recent_sessions,
    })
}
