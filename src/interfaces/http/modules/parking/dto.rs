//! Occupancy DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::services::{OccupancyTicket, ReleaseReceipt};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OccupyRequest {
    #[validate(length(min = 1, max = 20, message = "vehicle id is required"))]
    pub vehicle_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OccupyResponse {
    pub reservation_id: i64,
    pub lot_id: i64,
    pub slot_number: i32,
    pub started_at: DateTime<Utc>,
}

impl From<OccupancyTicket> for OccupyResponse {
    fn from(ticket: OccupancyTicket) -> Self {
        Self {
            reservation_id: ticket.reservation_id,
            lot_id: ticket.lot_id,
            slot_number: ticket.slot_number,
            started_at: ticket.started_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReleaseResponse {
    pub reservation_id: i64,
    pub lot_id: i64,
    pub slot_number: i32,
    pub entered_at: DateTime<Utc>,
    pub exited_at: DateTime<Utc>,
    /// Billable hours, floored at 1.0
    pub duration_hours: f64,
    pub cost: f64,
}

impl From<ReleaseReceipt> for ReleaseResponse {
    fn from(receipt: ReleaseReceipt) -> Self {
        Self {
            reservation_id: receipt.reservation_id,
            lot_id: receipt.lot_id,
            slot_number: receipt.slot_number,
            entered_at: receipt.entered_at,
            exited_at: receipt.exited_at,
            duration_hours: receipt.duration_hours,
            cost: receipt.cost,
        }
    }
}
