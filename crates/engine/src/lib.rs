//! Reconciliation engine: the polling cycle that turns status snapshots
//! into session records, and the read projection that assembles the
//! current view.

pub mod poll;
pub mod projection;

pub use poll::{run_cycle, PollError, PollOutcome, RECENT_FEED_LIMIT};
pub use projection::{project_status, OnlinePlayer, StatusReport, RECENT_REPORT_LIMIT};
