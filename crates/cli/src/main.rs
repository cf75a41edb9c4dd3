mod cli;

use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::{Cli, Commands};
use roster_engine::{project_status, run_cycle};
use roster_gateway::{AppState, PollSecret, ServerConfig};
use roster_source::HttpStatusSource;
use roster_store::{MemoryStore, SqliteStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roster=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let store = open_store(cli.db.as_deref())?;

    match cli.command {
        Commands::Serve {
            bind,
            status_url,
            poll_secret,
        } => {
            let state = AppState {
                store,
                source: Arc::new(HttpStatusSource::new(status_url)),
                secret: PollSecret::new(poll_secret),
            };
            roster_gateway::serve(ServerConfig { bind }, state).await
        }
        Commands::Poll { status_url } => {
            let source = HttpStatusSource::new(status_url);
            let now_ms = chrono::Utc::now().timestamp_millis();
            let outcome = run_cycle(store.as_ref(), &source, now_ms).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Commands::Status => {
            let report = project_status(store.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn open_store(path: Option<&Path>) -> anyhow::Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match path {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => {
            tracing::warn!("no database path configured; state will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
