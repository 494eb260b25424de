//! Parking lot domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DomainError, DomainResult};

/// A parking facility with a configured spot capacity and hourly price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub id: i64,
    /// Display name of the location
    pub name: String,
    pub address: String,
    pub pin_code: String,
    /// Price per parked hour
    pub hourly_price: f64,
    /// Configured maximum number of spots.
    /// Invariant: never below the count of currently occupied spots.
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

impl Lot {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        pin_code: impl Into<String>,
        hourly_price: f64,
        capacity: i32,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            address: address.into(),
            pin_code: pin_code.into(),
            hourly_price,
            capacity,
            created_at: Utc::now(),
        }
    }

    /// Validate admin-supplied lot attributes.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("lot name must not be empty".into()));
        }
        if self.hourly_price < 0.0 || !self.hourly_price.is_finite() {
            return Err(DomainError::Validation(
                "hourly price must be a non-negative number".into(),
            ));
        }
        if self.capacity < 0 {
            return Err(DomainError::Validation(
                "capacity must not be negative".into(),
            ));
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lot() -> Lot {
        Lot::new("Central Garage", "1 Main St", "110001", 10.0, 20)
    }

    #[test]
    fn valid_lot_passes() {
        assert!(sample_lot().validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut lot = sample_lot();
        lot.name = "  ".into();
        assert!(matches!(lot.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut lot = sample_lot();
        lot.hourly_price = -1.0;
        assert!(matches!(lot.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let mut lot = sample_lot();
        lot.capacity = -5;
        assert!(matches!(lot.validate(), Err(DomainError::Validation(_))));
    }
}
