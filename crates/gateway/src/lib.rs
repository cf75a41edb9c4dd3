//! HTTP surface: the poll trigger, the read endpoint, and health.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::{PollSecret, SECRET_HEADER};
pub use server::{router, serve, AppState, ServerConfig};
