use crate::auth::PollSecret;
use crate::handlers;
use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use roster_source::StatusSource;
use roster_store::Store;
use std::sync::Arc;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub source: Arc<dyn StatusSource>,
    pub secret: PollSecret,
}

/// Build the router; separate from `serve` so tests can drive handlers
/// without a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/poll", post(handlers::poll))
        .route("/api/status", get(handlers::status))
        .route("/healthz", get(handlers::health))
        .with_state(state)
}

pub async fn serve(config: ServerConfig, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("gateway listening on {}", config.bind);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "127.0.0.1:8080");
    }
}
