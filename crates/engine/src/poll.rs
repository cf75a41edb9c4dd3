// Reconciliation Cycle
//
// One polling pass: fetch -> normalize -> reconcile -> persist. The trigger
// fires on an external schedule and invocations may overlap; per-player
// writes therefore go through a versioned compare-and-swap instead of
// blind overwrites, and online-set changes use the store's idempotent
// add/remove primitives.
//
// Nothing is read from or written to the store until the payload has both
// fetched and normalized: an unreachable or unusable upstream must never be
// mistaken for an empty server, or every open session would wrongly close.

use roster_core::{
    diff_presence, normalize_payload, NormalizeError, PlayerRecord, PresenceDiff, PresentPlayer,
    ServerSnapshot,
};
use roster_source::{FetchError, StatusSource};
use roster_store::{keys, Store, StoreError};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Closed sessions kept in the global feed, across all players.
pub const RECENT_FEED_LIMIT: usize = 50;

/// Write attempts per record before conceding to an overlapping cycle.
const CAS_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stored record is malformed: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Report of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOutcome {
    pub now: i64,
    /// Players in the normalized present list (which can differ from the
    /// upstream's own claimed count).
    pub online_count: usize,
    pub joined: Vec<String>,
    pub left: Vec<String>,
}

/// Run one reconciliation cycle at `now_ms`.
pub async fn run_cycle(
    store: &dyn Store,
    source: &dyn StatusSource,
    now_ms: i64,
) -> Result<PollOutcome, PollError> {
    let payload = source.fetch().await?;
    let snapshot = normalize_payload(&payload)?;

    let previous: HashSet<String> = store
        .set_members(keys::ONLINE_PLAYERS)
        .await?
        .into_iter()
        .collect();
    let diff = diff_presence(&previous, &snapshot.players);

    persist(store, &snapshot, &diff, now_ms).await?;

    tracing::info!(
        online = snapshot.players.len(),
        joined = diff.joined.len(),
        left = diff.left.len(),
        "poll cycle complete"
    );

    Ok(PollOutcome {
        now: now_ms,
        online_count: snapshot.players.len(),
        joined: diff.joined,
        left: diff.left,
    })
}

/// The mutation phase. Write order: status first, then joins and
/// refreshes with their set-adds, leaves last. Within a leave, the
/// idempotent set-remove before the monotone session close.
async fn persist(
    store: &dyn Store,
    snapshot: &ServerSnapshot,
    diff: &PresenceDiff,
    now_ms: i64,
) -> Result<(), PollError> {
    store
        .put(
            keys::SERVER_STATUS,
            serde_json::to_value(snapshot.status_at(now_ms))?,
        )
        .await?;

    for id in &diff.joined {
        let Some(player) = snapshot.players.iter().find(|p| &p.id == id) else {
            continue;
        };
        apply_join(store, player, now_ms).await?;
    }

    // everyone reported present gets a refresh, joined players included
    for player in &snapshot.players {
        apply_refresh(store, player, now_ms).await?;
        store.set_add(keys::ONLINE_PLAYERS, &player.id).await?;
    }

    for id in &diff.left {
        apply_leave(store, id, now_ms).await?;
    }

    Ok(())
}

async fn apply_join(
    store: &dyn Store,
    player: &PresentPlayer,
    now_ms: i64,
) -> Result<(), PollError> {
    mutate_record(store, &player.id, now_ms, |record| {
        record.open_session(&player.name, now_ms)
    })
    .await
}

async fn apply_refresh(
    store: &dyn Store,
    player: &PresentPlayer,
    now_ms: i64,
) -> Result<(), PollError> {
    mutate_record(store, &player.id, now_ms, |record| {
        record.refresh(&player.name, now_ms)
    })
    .await
}

/// Load-or-create the player record, apply `op`, write it back with a
/// version check. A sustained conflict means an overlapping cycle holds
/// fresher data; this cycle's update for the player is abandoned.
async fn mutate_record<F>(
    store: &dyn Store,
    id: &str,
    now_ms: i64,
    op: F,
) -> Result<(), PollError>
where
    F: Fn(&mut PlayerRecord),
{
    let key = keys::player(id);
    for _ in 0..CAS_ATTEMPTS {
        let (mut record, version) = match store.get_versioned(&key).await? {
            Some((value, version)) => (serde_json::from_value(value)?, Some(version)),
            None => (PlayerRecord::new(id, "", now_ms), None),
        };
        op(&mut record);
        if store
            .put_if_version(&key, serde_json::to_value(&record)?, version)
            .await?
        {
            return Ok(());
        }
    }
    tracing::warn!(player = %id, "record update lost to a concurrent cycle");
    Ok(())
}

async fn apply_leave(store: &dyn Store, id: &str, now_ms: i64) -> Result<(), PollError> {
    // Membership goes first: the removal is idempotent, the close below is
    // not.
    store.set_remove(keys::ONLINE_PLAYERS, id).await?;

    let key = keys::player(id);
    let Some((value, mut version)) = store.get_versioned(&key).await? else {
        // never tracked; nothing to close
        return Ok(());
    };
    let mut record: PlayerRecord = serde_json::from_value(value)?;
    let Some(closed) = record.close_session(now_ms) else {
        // no open window; accounting no-op
        return Ok(());
    };

    store
        .list_push_front(keys::RECENT_SESSIONS, serde_json::to_value(&closed)?)
        .await?;
    store.list_trim(keys::RECENT_SESSIONS, RECENT_FEED_LIMIT).await?;

    // The monotone counters land last. On conflict, re-check that another
    // cycle has not already closed the window before trying again.
    for _ in 0..CAS_ATTEMPTS {
        if store
            .put_if_version(&key, serde_json::to_value(&record)?, Some(version))
            .await?
        {
            return Ok(());
        }
        let Some((value, fresh_version)) = store.get_versioned(&key).await? else {
            return Ok(());
        };
        let mut fresh: PlayerRecord = serde_json::from_value(value)?;
        if fresh.close_session(now_ms).is_none() {
            tracing::warn!(player = %id, "session already closed by a concurrent cycle");
            return Ok(());
        }
        record = fresh;
        version = fresh_version;
    }
    tracing::warn!(player = %id, "session close lost to a concurrent cycle");
    Ok(())
}
