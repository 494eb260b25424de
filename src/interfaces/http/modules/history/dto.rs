//! History and summary DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{HistoryRow, UserSummary};

/// One history row; `kind` is "active" or "completed" and decides which
/// optional fields are present.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryEntryResponse {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<i64>,
    pub lot_id: i64,
    pub lot_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_id: Option<i64>,
    pub vehicle_id: Option<String>,
    pub entered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exited_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl From<HistoryRow> for HistoryEntryResponse {
    fn from(row: HistoryRow) -> Self {
        match row {
            HistoryRow::Active {
                reservation_id,
                lot_id,
                lot_name,
                slot_number,
                vehicle_id,
                started_at,
            } => Self {
                kind: "active".to_string(),
                reservation_id: Some(reservation_id),
                lot_id,
                lot_name: Some(lot_name),
                slot_number: Some(slot_number),
                spot_id: None,
                vehicle_id,
                entered_at: started_at,
                exited_at: None,
                duration_hours: None,
                cost: None,
            },
            HistoryRow::Completed {
                lot_id,
                lot_name,
                spot_id,
                vehicle_id,
                entered_at,
                exited_at,
                duration_hours,
                cost,
            } => Self {
                kind: "completed".to_string(),
                reservation_id: None,
                lot_id,
                lot_name,
                slot_number: None,
                spot_id: Some(spot_id),
                vehicle_id: Some(vehicle_id),
                entered_at,
                exited_at: Some(exited_at),
                duration_hours: Some(duration_hours),
                cost: Some(cost),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub completed_sessions: u64,
    pub total_cost: f64,
    pub total_hours: f64,
    pub distinct_locations: u64,
    pub active_reservations: u64,
}

impl From<UserSummary> for SummaryResponse {
    fn from(s: UserSummary) -> Self {
        Self {
            completed_sessions: s.completed_sessions,
            total_cost: s.total_cost,
            total_hours: s.total_hours,
            distinct_locations: s.distinct_locations,
            active_reservations: s.active_reservations,
        }
    }
}
