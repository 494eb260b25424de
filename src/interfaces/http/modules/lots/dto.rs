//! Lot administration DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::services::LotWithSpots;
use crate::domain::{Lot, Spot};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLotRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 1, max = 10))]
    pub pin_code: String,
    #[validate(range(min = 0.0))]
    pub hourly_price: f64,
    #[validate(range(min = 0))]
    pub capacity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLotRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 10))]
    pub pin_code: Option<String>,
    #[validate(range(min = 0.0))]
    pub hourly_price: Option<f64>,
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LotResponse {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub pin_code: String,
    pub hourly_price: f64,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Lot> for LotResponse {
    fn from(lot: Lot) -> Self {
        Self {
            id: lot.id,
            name: lot.name,
            address: lot.address,
            pin_code: lot.pin_code,
            hourly_price: lot.hourly_price,
            capacity: lot.capacity,
            created_at: lot.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotResponse {
    pub number: i32,
    /// "A" = Available, "O" = Occupied
    pub status: String,
    pub vehicle_id: Option<String>,
    pub occupant_name: Option<String>,
    pub occupied_since: Option<DateTime<Utc>>,
}

impl From<Spot> for SlotResponse {
    fn from(spot: Spot) -> Self {
        Self {
            number: spot.number,
            status: spot.status.to_string(),
            vehicle_id: spot.vehicle_id,
            occupant_name: spot.occupant_name,
            occupied_since: spot.occupied_since,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LotDetailResponse {
    #[serde(flatten)]
    pub lot: LotResponse,
    pub occupied: usize,
    pub total: usize,
    pub slots: Vec<SlotResponse>,
}

impl From<LotWithSpots> for LotDetailResponse {
    fn from(listing: LotWithSpots) -> Self {
        let occupied = listing.spots.iter().filter(|s| s.is_occupied()).count();
        let total = listing.spots.len();
        Self {
            lot: listing.lot.into(),
            occupied,
            total,
            slots: listing.spots.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotCreatedResponse {
    pub slot_number: i32,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct SearchParams {
    /// Substring matched against name, address and pin code
    #[serde(default)]
    pub q: String,
}
