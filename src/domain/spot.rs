//! Parking spot domain entity and its occupancy state machine.
//!
//! A spot is either `Available` or `Occupied`; the only transitions are
//! occupy (Available → Occupied) and release (Occupied → Available).
//! There is no "reserved but not parked" intermediate state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DomainError, DomainResult};

/// Occupancy status of a spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpotStatus {
    Available,
    Occupied,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "A",
            Self::Occupied => "O",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "O" => Self::Occupied,
            _ => Self::Available,
        }
    }
}

impl Default for SpotStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One physical parking space within a lot.
///
/// Slot numbers within a lot form a contiguous 1..N range; renumbering
/// restores the invariant after any insertion or deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: i64,
    pub lot_id: i64,
    /// 1-based slot number, unique within the lot
    pub number: i32,
    pub status: SpotStatus,
    pub vehicle_id: Option<String>,
    /// Identity of the occupying user, checked on release
    pub occupant_id: Option<String>,
    pub occupant_name: Option<String>,
    pub occupied_since: Option<DateTime<Utc>>,
}

impl Spot {
    pub fn available(lot_id: i64, number: i32) -> Self {
        Self {
            id: 0,
            lot_id,
            number,
            status: SpotStatus::Available,
            vehicle_id: None,
            occupant_id: None,
            occupant_name: None,
            occupied_since: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.status == SpotStatus::Occupied
    }

    /// Transition Available → Occupied.
    pub fn occupy(
        &mut self,
        user_id: &str,
        display_name: &str,
        vehicle_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.is_occupied() {
            return Err(DomainError::Conflict(format!(
                "slot {} is already occupied",
                self.number
            )));
        }
        self.status = SpotStatus::Occupied;
        self.vehicle_id = Some(vehicle_id.to_string());
        self.occupant_id = Some(user_id.to_string());
        self.occupant_name = Some(display_name.to_string());
        self.occupied_since = Some(now);
        Ok(())
    }

    /// Transition Occupied → Available.
    ///
    /// Only the stored occupant may release; returns the occupation start
    /// time for usage accounting.
    pub fn release(&mut self, user_id: &str) -> DomainResult<DateTime<Utc>> {
        if !self.is_occupied() {
            return Err(DomainError::Conflict(format!(
                "slot {} is not occupied",
                self.number
            )));
        }
        if self.occupant_id.as_deref() != Some(user_id) {
            return Err(DomainError::Forbidden(
                "only the current occupant may release this slot".into(),
            ));
        }
        let since = self.occupied_since.ok_or_else(|| {
            DomainError::Storage(format!("occupied slot {} has no start time", self.number))
        })?;

        self.status = SpotStatus::Available;
        self.vehicle_id = None;
        self.occupant_id = None;
        self.occupant_name = None;
        self.occupied_since = None;
        Ok(since)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn occupied_spot() -> Spot {
        let mut s = Spot::available(1, 3);
        s.occupy("u1", "alice", "KA-01-1234", Utc::now()).unwrap();
        s
    }

    #[test]
    fn occupy_sets_all_occupancy_fields() {
        let s = occupied_spot();
        assert!(s.is_occupied());
        assert_eq!(s.vehicle_id.as_deref(), Some("KA-01-1234"));
        assert_eq!(s.occupant_id.as_deref(), Some("u1"));
        assert_eq!(s.occupant_name.as_deref(), Some("alice"));
        assert!(s.occupied_since.is_some());
    }

    #[test]
    fn occupy_occupied_spot_is_conflict() {
        let mut s = occupied_spot();
        let err = s.occupy("u2", "bob", "KA-02-0001", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        // first occupant untouched
        assert_eq!(s.occupant_id.as_deref(), Some("u1"));
    }

    #[test]
    fn release_clears_occupancy_and_returns_start() {
        let mut s = occupied_spot();
        let since = s.occupied_since.unwrap();
        let returned = s.release("u1").unwrap();
        assert_eq!(returned, since);
        assert!(!s.is_occupied());
        assert!(s.vehicle_id.is_none());
        assert!(s.occupant_id.is_none());
        assert!(s.occupant_name.is_none());
        assert!(s.occupied_since.is_none());
    }

    #[test]
    fn release_by_non_occupant_is_forbidden() {
        let mut s = occupied_spot();
        let err = s.release("u2").unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert!(s.is_occupied());
    }

    #[test]
    fn release_available_spot_is_conflict() {
        let mut s = Spot::available(1, 1);
        assert!(matches!(s.release("u1"), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn status_roundtrip() {
        assert_eq!(SpotStatus::from_str("A"), SpotStatus::Available);
        assert_eq!(SpotStatus::from_str("O"), SpotStatus::Occupied);
        assert_eq!(SpotStatus::from_str("junk"), SpotStatus::Available);
        assert_eq!(SpotStatus::Occupied.to_string(), "O");
    }
}
