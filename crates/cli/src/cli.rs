use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roster", author, version, about = "Game server presence and session tracker", long_about = None)]
pub struct Cli {
    /// Sqlite database path; omit for a non-persistent in-memory store
    #[arg(long, env = "ROSTER_DB", value_name = "FILE", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Listen address
        #[arg(long, env = "ROSTER_BIND", default_value = "127.0.0.1:8080")]
        bind: String,

        /// Upstream status endpoint
        #[arg(long, env = "STATUS_API_URL", value_name = "URL")]
        status_url: String,

        /// Shared secret required by the poll trigger
        #[arg(long, env = "POLL_SECRET", hide_env_values = true)]
        poll_secret: String,
    },

    /// Run a single reconciliation cycle and print the outcome
    Poll {
        /// Upstream status endpoint
        #[arg(long, env = "STATUS_API_URL", value_name = "URL")]
        status_url: String,
    },

    /// Print the current status projection
    Status,
}
