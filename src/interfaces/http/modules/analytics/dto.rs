//! Analytics DTOs

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::LotOccupancy;

#[derive(Debug, Serialize, ToSchema)]
pub struct LotOccupancyResponse {
    pub lot_id: i64,
    pub lot_name: String,
    pub occupied: u64,
    pub total: u64,
    /// occupied / total, 0 when the lot has no spots
    pub utilization: f64,
}

impl From<LotOccupancy> for LotOccupancyResponse {
    fn from(o: LotOccupancy) -> Self {
        Self {
            lot_id: o.lot_id,
            lot_name: o.lot_name,
            occupied: o.occupied,
            total: o.total,
            utilization: o.utilization,
        }
    }
}
