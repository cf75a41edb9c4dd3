// Status Payload Normalization
//
// The upstream status endpoint is not a fixed contract: deployments differ
// in how they spell the motd, the version, the player counts, and the player
// list. Every field here is resolved through an ordered alias list with one
// coercion rule, so supporting a new deployment shape means adding an alias,
// not another conditional chain.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Placeholder motd when the payload carries none.
pub const MOTD_FALLBACK: &str = "unknown";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("status payload is not a JSON object")]
    NotAnObject,
}

/// One player reported present in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentPlayer {
    pub id: String,
    pub name: String,
}

/// Canonical view of one poll's status payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    pub online: bool,
    pub motd: String,
    pub version: String,
    pub players_online: u32,
    pub players_max: Option<u32>,
    pub players: Vec<PresentPlayer>,
}

impl ServerSnapshot {
    /// Status record for this snapshot, stamped with the poll time.
    pub fn status_at(&self, now_ms: i64) -> ServerStatus {
        ServerStatus {
            online: self.online,
            motd: self.motd.clone(),
            version: self.version.clone(),
            players_online: self.players_online,
            players_max: self.players_max,
            last_poll: now_ms,
        }
    }
}

/// Stored server-level status, overwritten on every successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub online: bool,
    pub motd: String,
    pub version: String,
    pub players_online: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players_max: Option<u32>,
    pub last_poll: i64,
}

/// Normalize a raw status payload.
///
/// Tolerates the field aliases documented above; entries in the player list
/// without a usable id or name are dropped: a player that cannot be
/// addressed cannot be session-tracked, and a display name is never
/// invented for one. Anything that is at least a JSON object normalizes;
/// only a non-object payload is an error.
pub fn normalize_payload(payload: &Value) -> Result<ServerSnapshot, NormalizeError> {
    if !payload.is_object() {
        return Err(NormalizeError::NotAnObject);
    }

    let online = lookup(payload, "online")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let motd = resolve_string(payload, &["motd", "motd.clean", "motd.raw"])
        .unwrap_or_else(|| MOTD_FALLBACK.to_string());

    let version = resolve_string(payload, &["version", "version.name"]).unwrap_or_default();

    let players_online =
        resolve_count(payload, &["players.online", "players.onlineCount"]).unwrap_or(0);
    let players_max = resolve_count(payload, &["players.max", "players.maxCount"]);

    let raw_list = lookup(payload, "players.list")
        .or_else(|| lookup(payload, "players.sample"))
        .and_then(Value::as_array);

    let mut players = Vec::new();
    let mut seen = HashSet::new();
    if let Some(entries) = raw_list {
        for entry in entries {
            let id = resolve_string(entry, &["uuid", "id"]).unwrap_or_default();
            let name = resolve_string(entry, &["name", "username"]).unwrap_or_default();
            if id.is_empty() || name.is_empty() {
                continue;
            }
            // first occurrence wins
            if !seen.insert(id.clone()) {
                continue;
            }
            players.push(PresentPlayer { id, name });
        }
    }

    Ok(ServerSnapshot {
        online,
        motd,
        version,
        players_online,
        players_max,
        players,
    })
}

/// Dotted key path lookup: `"players.online"` walks nested objects.
fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(payload, |value, key| value.get(key))
}

/// First alias that yields a string; bare numbers are stringified.
fn resolve_string(payload: &Value, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|path| coerce_string(lookup(payload, path)?))
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First alias that yields a count; negatives clamp to zero.
fn resolve_count(payload: &Value, aliases: &[&str]) -> Option<u32> {
    aliases
        .iter()
        .find_map(|path| coerce_count(lookup(payload, path)?))
}

fn coerce_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(u.min(u32::MAX as u64) as u32)
            } else if let Some(f) = n.as_f64() {
                Some(if f > 0.0 { f as u32 } else { 0 })
            } else {
                Some(0)
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .map(|v| v.clamp(0, u32::MAX as i64) as u32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_canonical_shape() {
        let payload = json!({
            "online": true,
            "motd": "Welcome",
            "version": "1.20.4",
            "players": {
                "online": 2,
                "max": 20,
                "list": [
                    { "uuid": "u1", "name": "Alice" },
                    { "uuid": "u2", "name": "Bob" }
                ]
            }
        });

        let snapshot = normalize_payload(&payload).unwrap();
        assert!(snapshot.online);
        assert_eq!(snapshot.motd, "Welcome");
        assert_eq!(snapshot.version, "1.20.4");
        assert_eq!(snapshot.players_online, 2);
        assert_eq!(snapshot.players_max, Some(20));
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].id, "u1");
        assert_eq!(snapshot.players[0].name, "Alice");
    }

    #[test]
    fn normalizes_aliased_shape() {
        let payload = json!({
            "online": true,
            "motd": { "clean": "Clean text", "raw": "§aRaw text" },
            "version": { "name": "Paper 1.21" },
            "players": {
                "onlineCount": 1,
                "maxCount": 50,
                "sample": [
                    { "id": "u1", "username": "Alice" }
                ]
            }
        });

        let snapshot = normalize_payload(&payload).unwrap();
        assert_eq!(snapshot.motd, "Clean text");
        assert_eq!(snapshot.version, "Paper 1.21");
        assert_eq!(snapshot.players_online, 1);
        assert_eq!(snapshot.players_max, Some(50));
        assert_eq!(snapshot.players[0].id, "u1");
        assert_eq!(snapshot.players[0].name, "Alice");
    }

    #[test]
    fn drops_entries_without_id_or_name() {
        let payload = json!({
            "online": true,
            "players": {
                "list": [
                    { "uuid": "u1", "name": "Alice" },
                    { "uuid": "", "name": "Ghost" },
                    { "name": "NoId" },
                    { "uuid": "u2" },
                    { "uuid": "u3", "name": "" }
                ]
            }
        });

        let snapshot = normalize_payload(&payload).unwrap();
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].id, "u1");
    }

    #[test]
    fn drops_duplicate_ids_keeping_first() {
        let payload = json!({
            "players": {
                "list": [
                    { "uuid": "u1", "name": "First" },
                    { "uuid": "u1", "name": "Second" }
                ]
            }
        });

        let snapshot = normalize_payload(&payload).unwrap();
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].name, "First");
    }

    #[test]
    fn coerces_numeric_ids_and_names() {
        let payload = json!({
            "players": {
                "list": [ { "id": 42, "name": 7 } ]
            }
        });

        let snapshot = normalize_payload(&payload).unwrap();
        assert_eq!(snapshot.players[0].id, "42");
        assert_eq!(snapshot.players[0].name, "7");
    }

    #[test]
    fn clamps_negative_counts_to_zero() {
        let payload = json!({
            "players": { "online": -3, "max": -1 }
        });

        let snapshot = normalize_payload(&payload).unwrap();
        assert_eq!(snapshot.players_online, 0);
        assert_eq!(snapshot.players_max, Some(0));
    }

    #[test]
    fn parses_string_counts() {
        let payload = json!({
            "players": { "online": "5", "max": "20" }
        });

        let snapshot = normalize_payload(&payload).unwrap();
        assert_eq!(snapshot.players_online, 5);
        assert_eq!(snapshot.players_max, Some(20));
    }

    #[test]
    fn defaults_when_fields_missing() {
        let snapshot = normalize_payload(&json!({})).unwrap();
        assert!(!snapshot.online);
        assert_eq!(snapshot.motd, MOTD_FALLBACK);
        assert_eq!(snapshot.version, "");
        assert_eq!(snapshot.players_online, 0);
        assert_eq!(snapshot.players_max, None);
        assert!(snapshot.players.is_empty());
    }

    #[test]
    fn rejects_non_object_payload() {
        assert!(normalize_payload(&json!("nope")).is_err());
        assert!(normalize_payload(&json!([1, 2, 3])).is_err());
        assert!(normalize_payload(&json!(null)).is_err());
    }

    #[test]
    fn status_record_carries_poll_time() {
        let payload = json!({ "online": true, "motd": "hi" });
        let snapshot = normalize_payload(&payload).unwrap();
        let status = snapshot.status_at(12345);
        assert!(status.online);
        assert_eq!(status.motd, "hi");
        assert_eq!(status.last_poll, 12345);
    }
}
