// Endpoint Handlers

use crate::auth::SECRET_HEADER;
use crate::server::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use roster_engine::{project_status, run_cycle, PollError};
use serde_json::{json, Value};

/// POST /api/poll: authorize, then run one reconciliation cycle.
pub async fn poll(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !state.secret.verify(presented) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "error": "unauthorized" })),
        );
    }

    let now_ms = chrono::Utc::now().timestamp_millis();
    match run_cycle(state.store.as_ref(), state.source.as_ref(), now_ms).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "now": outcome.now,
                "onlineCount": outcome.online_count,
                "joined": outcome.joined,
                "left": outcome.left,
            })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "poll cycle failed");
            let status = match &err {
                // the upstream is the broken party
                PollError::Fetch(_) | PollError::Normalize(_) => StatusCode::BAD_GATEWAY,
                PollError::Store(_) | PollError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(json!({ "ok": false, "error": err.to_string() })))
        }
    }
}

/// GET /api/status: the read projection. Never mutates.
pub async fn status(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match project_status(state.store.as_ref()).await {
        Ok(report) => match serde_json::to_value(&report) {
            Ok(body) => (StatusCode::OK, Json(body)),
            Err(err) => {
                tracing::error!(error = %err, "status report failed to serialize");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "ok": false, "error": "internal error" })),
                )
            }
        },
        Err(err) => {
            tracing::error!(error = %err, "status projection failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": err.to_string() })),
            )
        }
    }
}

/// GET /healthz
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PollSecret;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use roster_source::{FetchError, StatusSource};
    use roster_store::{keys, MemoryStore, Store};
    use std::sync::Arc;

    struct StaticSource(Result<Value, u16>);

    #[async_trait]
    impl StatusSource for StaticSource {
        async fn fetch(&self) -> Result<Value, FetchError> {
            match &self.0 {
                Ok(payload) => Ok(payload.clone()),
                Err(status) => Err(FetchError::Status {
                    url: "http://example.test/status".to_string(),
                    status: *status,
                }),
            }
        }
    }

    fn app_state(source: StaticSource) -> AppState {
        AppState {
            store: Arc::new(MemoryStore::new()),
            source: Arc::new(source),
            secret: PollSecret::new("trigger-secret"),
        }
    }

    fn authorized_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SECRET_HEADER, HeaderValue::from_static("trigger-secret"));
        headers
    }

    #[tokio::test]
    async fn poll_without_secret_is_unauthorized() {
        let state = app_state(StaticSource(Ok(json!({ "online": true }))));
        let store = state.store.clone();

        let (status, Json(body)) = poll(State(state), HeaderMap::new()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["ok"], false);

        // rejected before any work: nothing was written
        assert!(store.get(keys::SERVER_STATUS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn poll_with_wrong_secret_is_unauthorized() {
        let state = app_state(StaticSource(Ok(json!({ "online": true }))));
        let mut headers = HeaderMap::new();
        headers.insert(SECRET_HEADER, HeaderValue::from_static("wrong"));

        let (status, _) = poll(State(state), headers).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn poll_runs_cycle_and_reports_outcome() {
        let payload = json!({
            "online": true,
            "players": { "online": 1, "list": [{ "uuid": "a", "name": "Ava" }] }
        });
        let state = app_state(StaticSource(Ok(payload)));
        let store = state.store.clone();

        let (status, Json(body)) = poll(State(state), authorized_headers()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["onlineCount"], 1);
        assert_eq!(body["joined"], json!(["a"]));
        assert_eq!(body["left"], json!([]));

        assert_eq!(
            store.set_members(keys::ONLINE_PLAYERS).await.unwrap(),
            vec!["a"]
        );
    }

    #[tokio::test]
    async fn poll_maps_upstream_failure_to_bad_gateway() {
        let state = app_state(StaticSource(Err(500)));

        let (status, Json(body)) = poll(State(state), authorized_headers()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn status_succeeds_on_empty_store() {
        let state = app_state(StaticSource(Ok(json!({}))));

        let (status, Json(body)) = super::status(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["server"]["online"], false);
        assert_eq!(body["onlinePlayers"], json!([]));
        assert_eq!(body["recentSessions"], json!([]));
    }

    #[tokio::test]
    async fn health_reports_version() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
