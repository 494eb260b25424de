//! Read-only view rows derived from reservations and the usage ledger.
//!
//! These are projections for display and reporting; they are never a
//! source of truth and no write is ever driven from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a user's parking history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryRow {
    /// Currently open reservation, joined with its spot/lot for display.
    Active {
        reservation_id: i64,
        lot_id: i64,
        lot_name: String,
        slot_number: i32,
        vehicle_id: Option<String>,
        started_at: DateTime<Utc>,
    },
    /// Completed episode from the usage ledger.
    Completed {
        lot_id: i64,
        lot_name: Option<String>,
        spot_id: i64,
        vehicle_id: String,
        entered_at: DateTime<Utc>,
        exited_at: DateTime<Utc>,
        duration_hours: f64,
        cost: f64,
    },
}

/// Aggregated usage of one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub completed_sessions: u64,
    pub total_cost: f64,
    pub total_hours: f64,
    /// Distinct lots ever parked in.
    pub distinct_locations: u64,
    pub active_reservations: u64,
}

/// Per-lot occupancy figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotOccupancy {
    pub lot_id: i64,
    pub lot_name: String,
    pub occupied: u64,
    pub total: u64,
    /// occupied / total, 0.0 for an empty lot.
    pub utilization: f64,
}

impl LotOccupancy {
    pub fn new(lot_id: i64, lot_name: impl Into<String>, occupied: u64, total: u64) -> Self {
        let utilization = if total == 0 {
            0.0
        } else {
            occupied as f64 / total as f64
        };
        Self {
            lot_id,
            lot_name: lot_name.into(),
            occupied,
            total,
            utilization,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_is_ratio() {
        let o = LotOccupancy::new(1, "Central", 3, 4);
        assert_eq!(o.utilization, 0.75);
    }

    #[test]
    fn empty_lot_has_zero_utilization() {
        let o = LotOccupancy::new(1, "Empty", 0, 0);
        assert_eq!(o.utilization, 0.0);
    }
}
