//! Occupancy engine: the Available ⇄ Occupied state machine with its
//! reservation and usage-log bookkeeping.
//!
//! Each operation computes the transition against a snapshot and commits
//! it through a guarded storage call; the guard re-checks the spot state
//! inside one transaction, so concurrent writers on the same spot resolve
//! to exactly one winner. Cache invalidation and notification enqueue
//! happen after commit and never fail the operation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{
    close_reservation, Caller, DomainError, DomainResult, Reservation, Storage,
};
use crate::infrastructure::cache::{CacheEntity, CacheLayer};
use crate::notifications::events::{SpotOccupiedEvent, SpotReleasedEvent};
use crate::notifications::{Dispatcher, Event};

/// Confirmation returned by a successful occupy.
#[derive(Debug, Clone)]
pub struct OccupancyTicket {
    pub reservation_id: i64,
    pub lot_id: i64,
    pub slot_number: i32,
    pub started_at: DateTime<Utc>,
}

/// Billing receipt returned by a successful release.
#[derive(Debug, Clone)]
pub struct ReleaseReceipt {
    pub reservation_id: i64,
    pub lot_id: i64,
    pub slot_number: i32,
    pub entered_at: DateTime<Utc>,
    pub exited_at: DateTime<Utc>,
    pub duration_hours: f64,
    pub cost: f64,
}

/// Service driving spot occupancy transitions.
pub struct OccupancyService {
    storage: Arc<dyn Storage>,
    cache: CacheLayer,
    dispatcher: Dispatcher,
}

impl OccupancyService {
    pub fn new(storage: Arc<dyn Storage>, cache: CacheLayer, dispatcher: Dispatcher) -> Self {
        Self {
            storage,
            cache,
            dispatcher,
        }
    }

    /// Occupy a slot, creating an open reservation.
    ///
    /// Valid only from Available; a spot already occupied (or grabbed by a
    /// concurrent caller between snapshot and commit) fails with
    /// `Conflict`.
    pub async fn occupy(
        &self,
        caller: &Caller,
        lot_id: i64,
        slot_number: i32,
        vehicle_id: &str,
    ) -> DomainResult<OccupancyTicket> {
        let (user_id, username) = caller.require_user()?;
        let vehicle_id = vehicle_id.trim();
        if vehicle_id.is_empty() {
            return Err(DomainError::Validation("vehicle id is required".into()));
        }

        let lot = self
            .storage
            .get_lot(lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lot", "id", lot_id))?;
        let spot = self
            .storage
            .find_spot(lot.id, slot_number)
            .await?
            .ok_or_else(|| DomainError::not_found("Spot", "number", slot_number))?;

        let now = Utc::now();
        let mut after = spot.clone();
        after.occupy(user_id, username, vehicle_id, now)?;

        let reservation = self
            .storage
            .apply_occupy(after, Reservation::open(spot.id, user_id, now))
            .await?;

        info!(
            lot_id,
            slot_number,
            reservation_id = reservation.id,
            user = username,
            "slot occupied"
        );

        self.cache
            .invalidate(&[
                CacheEntity::Lot(lot_id),
                CacheEntity::User(user_id.to_string()),
                CacheEntity::AdminSummary,
            ])
            .await;
        self.dispatcher.enqueue(
            Event::SpotOccupied(SpotOccupiedEvent {
                lot_id,
                spot_id: spot.id,
                slot_number,
                user_id: user_id.to_string(),
                vehicle_id: vehicle_id.to_string(),
                reservation_id: reservation.id,
                timestamp: now,
            }),
            Duration::ZERO,
        );

        Ok(OccupancyTicket {
            reservation_id: reservation.id,
            lot_id,
            slot_number,
            started_at: now,
        })
    }

    /// Release a slot: close its reservation, write the usage-log entry
    /// and reset the spot, all as one atomic unit.
    ///
    /// Only the current occupant may release; a missing open reservation
    /// for an occupied spot is `NotFound`.
    pub async fn release(
        &self,
        caller: &Caller,
        lot_id: i64,
        slot_number: i32,
    ) -> DomainResult<ReleaseReceipt> {
        let (user_id, _) = caller.require_user()?;

        let lot = self
            .storage
            .get_lot(lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lot", "id", lot_id))?;
        let spot = self
            .storage
            .find_spot(lot.id, slot_number)
            .await?
            .ok_or_else(|| DomainError::not_found("Spot", "number", slot_number))?;

        // transition first: not-occupied is Conflict, wrong occupant is
        // Forbidden, both checked against the stored occupant identity
        let mut after = spot.clone();
        let entered_at = after.release(user_id)?;

        let reservation = self
            .storage
            .find_open_reservation(spot.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "spot_id", spot.id))?;

        let exited_at = Utc::now();
        let vehicle_id = spot.vehicle_id.clone().unwrap_or_default();
        let (closed, entry) = close_reservation(
            reservation,
            lot_id,
            &vehicle_id,
            entered_at,
            exited_at,
            lot.hourly_price,
        );
        let reservation_id = closed.id;

        let entry = self.storage.apply_release(after, closed, entry).await?;

        info!(
            lot_id,
            slot_number,
            reservation_id,
            cost = entry.cost,
            hours = entry.duration_hours,
            "slot released"
        );

        self.cache
            .invalidate(&[
                CacheEntity::Lot(lot_id),
                CacheEntity::User(user_id.to_string()),
                CacheEntity::AdminSummary,
            ])
            .await;
        self.dispatcher.enqueue(
            Event::SpotReleased(SpotReleasedEvent {
                lot_id,
                spot_id: spot.id,
                slot_number,
                user_id: user_id.to_string(),
                duration_hours: entry.duration_hours,
                cost: entry.cost,
                timestamp: exited_at,
            }),
            Duration::ZERO,
        );

        Ok(ReleaseReceipt {
            reservation_id,
            lot_id,
            slot_number,
            entered_at,
            exited_at,
            duration_hours: entry.duration_hours,
            cost: entry.cost,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Lot, Spot, SpotStatus};
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::notifications::create_event_bus;

    async fn service_with_lot() -> (OccupancyService, Arc<InMemoryStorage>, i64) {
        let storage = Arc::new(InMemoryStorage::new());
        let lot = storage
            .insert_lot_with_spots(
                Lot::new("Central", "1 Main St", "110001", 10.0, 3),
                (1..=3).map(|n| Spot::available(0, n)).collect(),
            )
            .await
            .unwrap();
        let service = OccupancyService::new(
            storage.clone(),
            CacheLayer::disabled(),
            Dispatcher::new(create_event_bus()),
        );
        (service, storage, lot.id)
    }

    #[tokio::test]
    async fn occupy_creates_open_reservation() {
        let (service, storage, lot_id) = service_with_lot().await;
        let caller = Caller::user("u1", "alice");

        let ticket = service
            .occupy(&caller, lot_id, 1, "KA-01-1234")
            .await
            .unwrap();

        let spot = storage.find_spot(lot_id, 1).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Occupied);
        assert_eq!(spot.occupant_id.as_deref(), Some("u1"));

        let reservation = storage
            .get_reservation(ticket.reservation_id)
            .await
            .unwrap()
            .unwrap();
        assert!(reservation.is_open());
        assert_eq!(reservation.user_id, "u1");
    }

    #[tokio::test]
    async fn occupy_occupied_slot_is_conflict() {
        let (service, _, lot_id) = service_with_lot().await;
        service
            .occupy(&Caller::user("u1", "alice"), lot_id, 1, "V-1")
            .await
            .unwrap();

        let err = service
            .occupy(&Caller::user("u2", "bob"), lot_id, 1, "V-2")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn concurrent_occupy_has_exactly_one_winner() {
        let (service, _, lot_id) = service_with_lot().await;
        let alice = Caller::user("u1", "alice");
        let bob = Caller::user("u2", "bob");

        let (a, b) = tokio::join!(
            service.occupy(&alice, lot_id, 2, "V-1"),
            service.occupy(&bob, lot_id, 2, "V-2"),
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser.unwrap_err(), DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn occupy_missing_slot_is_not_found() {
        let (service, _, lot_id) = service_with_lot().await;
        let err = service
            .occupy(&Caller::user("u1", "alice"), lot_id, 99, "V-1")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn occupy_requires_sign_in_and_vehicle() {
        let (service, _, lot_id) = service_with_lot().await;
        assert!(matches!(
            service.occupy(&Caller::Anonymous, lot_id, 1, "V-1").await,
            Err(DomainError::Unauthorized(_))
        ));
        assert!(matches!(
            service
                .occupy(&Caller::user("u1", "alice"), lot_id, 1, "  ")
                .await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn release_bills_minimum_hour_and_frees_spot() {
        let (service, storage, lot_id) = service_with_lot().await;
        let caller = Caller::user("u1", "alice");
        let ticket = service.occupy(&caller, lot_id, 1, "V-1").await.unwrap();

        let receipt = service.release(&caller, lot_id, 1).await.unwrap();

        // sub-second session clamps to the one-hour floor at $10/h
        assert_eq!(receipt.duration_hours, 1.0);
        assert_eq!(receipt.cost, 10.0);
        assert_eq!(receipt.reservation_id, ticket.reservation_id);

        let spot = storage.find_spot(lot_id, 1).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Available);
        assert!(spot.vehicle_id.is_none());

        let reservation = storage
            .get_reservation(ticket.reservation_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!reservation.is_open());
        assert_eq!(reservation.cost, Some(10.0));

        let usage = storage.list_usage_for_user("u1").await.unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].cost, 10.0);
        assert_eq!(usage[0].remarks, "auto-logged on release");
    }

    #[tokio::test]
    async fn release_by_non_occupant_is_forbidden() {
        let (service, storage, lot_id) = service_with_lot().await;
        service
            .occupy(&Caller::user("u1", "alice"), lot_id, 1, "V-1")
            .await
            .unwrap();

        let err = service
            .release(&Caller::user("u2", "bob"), lot_id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        // nothing changed
        let spot = storage.find_spot(lot_id, 1).await.unwrap().unwrap();
        assert!(spot.is_occupied());
        assert!(storage.list_usage_for_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn release_available_slot_is_conflict() {
        let (service, _, lot_id) = service_with_lot().await;
        let err = service
            .release(&Caller::user("u1", "alice"), lot_id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn released_slot_can_be_occupied_again() {
        let (service, _, lot_id) = service_with_lot().await;
        let caller = Caller::user("u1", "alice");
        service.occupy(&caller, lot_id, 1, "V-1").await.unwrap();
        service.release(&caller, lot_id, 1).await.unwrap();

        let second = service.occupy(&caller, lot_id, 1, "V-1").await.unwrap();
        assert!(second.reservation_id > 0);
    }
}
