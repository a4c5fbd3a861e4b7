//! Caller-side monitoring for the opal bid engine.
//!
//! This crate provides:
//! - Captured page snapshots (JSON lines, text or HTML)
//! - A poll session that applies at most one bid update per poll
//! - Session metrics
//! - A SQLite-backed seen-set

pub mod metrics;
pub mod seen_store;
pub mod session;
pub mod snapshot;

pub use metrics::{AppliedBid, MetricsCalculator, SessionMetrics};
pub use seen_store::SqliteSeenSet;
pub use session::MonitorSession;
pub use snapshot::{load_snapshots, parse_snapshots, PageSnapshot, SnapshotFormat};
