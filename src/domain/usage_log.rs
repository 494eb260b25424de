//! Usage log domain entity
//!
//! Append-only ledger of completed occupancy episodes. Entries are never
//! mutated and survive deletion of the spot or lot they reference; they
//! are the durable source for history, billing and reports.

use chrono::{DateTime, Utc};

/// Remarks written on entries produced by the release path.
pub const AUTO_RELEASE_REMARKS: &str = "auto-logged on release";

/// Immutable record of one completed occupancy episode.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageLogEntry {
    pub id: i64,
    pub user_id: String,
    pub spot_id: i64,
    pub lot_id: i64,
    pub vehicle_id: String,
    pub entered_at: DateTime<Utc>,
    pub exited_at: DateTime<Utc>,
    /// Billable duration in hours, never below the one-hour floor.
    pub duration_hours: f64,
    pub cost: f64,
    pub remarks: String,
}
