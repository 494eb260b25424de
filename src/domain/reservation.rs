//! Reservation domain entity
//!
//! One occupancy episode: created open when a spot is occupied, closed
//! (end timestamp + cost) when the spot is released. The occupancy engine
//! enforces at most one open reservation per spot.

use chrono::{DateTime, Utc};

/// One occupancy episode of a spot by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: i64,
    pub spot_id: i64,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cost: Option<f64>,
}

impl Reservation {
    /// Open a new reservation for a spot.
    pub fn open(spot_id: i64, user_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            spot_id,
            user_id: user_id.into(),
            started_at,
            ended_at: None,
            cost: None,
        }
    }

    /// Close the episode with its exit time and computed cost.
    pub fn close(&mut self, ended_at: DateTime<Utc>, cost: f64) {
        self.ended_at = Some(ended_at);
        self.cost = Some(cost);
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reservation_is_open() {
        let r = Reservation::open(7, "u1", Utc::now());
        assert!(r.is_open());
        assert!(r.ended_at.is_none());
        assert!(r.cost.is_none());
    }

    #[test]
    fn close_sets_end_and_cost() {
        let mut r = Reservation::open(7, "u1", Utc::now());
        let end = Utc::now();
        r.close(end, 13.0);
        assert!(!r.is_open());
        assert_eq!(r.ended_at, Some(end));
        assert_eq!(r.cost, Some(13.0));
    }
}
