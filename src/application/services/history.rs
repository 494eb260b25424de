//! History and summary views.
//!
//! Read-only projections over open reservations and the usage ledger.
//! Reads may be served from the cache; no write is ever driven from
//! these views - the occupancy engine always re-reads storage inside its
//! own transaction.

use std::sync::Arc;

use crate::domain::{
    Caller, DomainError, DomainResult, HistoryRow, LotOccupancy, Storage, UserSummary,
};
use crate::infrastructure::cache::{keys, CacheLayer, TTL_HISTORY, TTL_SUMMARY};

pub struct HistoryService {
    storage: Arc<dyn Storage>,
    cache: CacheLayer,
}

impl HistoryService {
    pub fn new(storage: Arc<dyn Storage>, cache: CacheLayer) -> Self {
        Self { storage, cache }
    }

    /// A user's parking history: open reservations first (joined with
    /// spot/lot for display), then completed episodes from the usage
    /// ledger, newest exit first.
    pub async fn history_for(&self, caller: &Caller) -> DomainResult<Vec<HistoryRow>> {
        let (user_id, _) = caller.require_user()?;

        let key = keys::user_history(user_id);
        if let Some(cached) = self.cache.get_json::<Vec<HistoryRow>>(&key).await {
            return Ok(cached);
        }

        let mut rows = Vec::new();

        for reservation in self
            .storage
            .list_open_reservations_for_user(user_id)
            .await?
        {
            let spot = self
                .storage
                .get_spot(reservation.spot_id)
                .await?
                .ok_or_else(|| {
                    DomainError::Storage(format!(
                        "open reservation {} references missing spot {}",
                        reservation.id, reservation.spot_id
                    ))
                })?;
            let lot = self
                .storage
                .get_lot(spot.lot_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Lot", "id", spot.lot_id))?;
            rows.push(HistoryRow::Active {
                reservation_id: reservation.id,
                lot_id: lot.id,
                lot_name: lot.name,
                slot_number: spot.number,
                vehicle_id: spot.vehicle_id,
                started_at: reservation.started_at,
            });
        }

        for entry in self.storage.list_usage_for_user(user_id).await? {
            // the lot may have been deleted since; the ledger entry stands
            let lot_name = self
                .storage
                .get_lot(entry.lot_id)
                .await?
                .map(|l| l.name);
            rows.push(HistoryRow::Completed {
                lot_id: entry.lot_id,
                lot_name,
                spot_id: entry.spot_id,
                vehicle_id: entry.vehicle_id,
                entered_at: entry.entered_at,
                exited_at: entry.exited_at,
                duration_hours: entry.duration_hours,
                cost: entry.cost,
            });
        }

        self.cache.set_json(&key, &rows, TTL_HISTORY).await;
        Ok(rows)
    }

    /// Aggregate usage of the calling user.
    pub async fn summary_for(&self, caller: &Caller) -> DomainResult<UserSummary> {
        let (user_id, _) = caller.require_user()?;

        let key = keys::user_summary(user_id);
        if let Some(cached) = self.cache.get_json::<UserSummary>(&key).await {
            return Ok(cached);
        }

        let entries = self.storage.list_usage_for_user(user_id).await?;
        let open = self
            .storage
            .list_open_reservations_for_user(user_id)
            .await?;

        let mut locations: Vec<i64> = entries.iter().map(|e| e.lot_id).collect();
        locations.sort_unstable();
        locations.dedup();

        let summary = UserSummary {
            completed_sessions: entries.len() as u64,
            total_cost: entries.iter().map(|e| e.cost).sum(),
            total_hours: entries.iter().map(|e| e.duration_hours).sum(),
            distinct_locations: locations.len() as u64,
            active_reservations: open.len() as u64,
        };

        self.cache.set_json(&key, &summary, TTL_SUMMARY).await;
        Ok(summary)
    }

    /// Per-lot occupied/total counts and utilization for the admin
    /// dashboard.
    pub async fn admin_summary(&self, caller: &Caller) -> DomainResult<Vec<LotOccupancy>> {
        caller.require_admin()?;

        let key = keys::admin_summary();
        if let Some(cached) = self.cache.get_json::<Vec<LotOccupancy>>(&key).await {
            return Ok(cached);
        }

        let mut summary = Vec::new();
        for lot in self.storage.list_lots().await? {
            let total = self.storage.count_spots(lot.id).await?;
            let occupied = self.storage.count_occupied(lot.id).await?;
            summary.push(LotOccupancy::new(lot.id, lot.name, occupied, total));
        }

        self.cache.set_json(&key, &summary, TTL_SUMMARY).await;
        Ok(summary)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::occupancy::OccupancyService;
    use crate::domain::{Lot, Spot};
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::notifications::{create_event_bus, Dispatcher};

    async fn fixture() -> (HistoryService, OccupancyService, i64) {
        let storage = Arc::new(InMemoryStorage::new());
        let lot = storage
            .insert_lot_with_spots(
                Lot::new("Central", "1 Main St", "110001", 10.0, 3),
                (1..=3).map(|n| Spot::available(0, n)).collect(),
            )
            .await
            .unwrap();
        let occupancy = OccupancyService::new(
            storage.clone(),
            CacheLayer::disabled(),
            Dispatcher::new(create_event_bus()),
        );
        let history = HistoryService::new(storage, CacheLayer::disabled());
        (history, occupancy, lot.id)
    }

    #[tokio::test]
    async fn cycle_yields_one_completed_row_and_no_active() {
        let (history, occupancy, lot_id) = fixture().await;
        let caller = Caller::user("u1", "alice");

        occupancy.occupy(&caller, lot_id, 1, "V-1").await.unwrap();
        occupancy.release(&caller, lot_id, 1).await.unwrap();

        let rows = history.history_for(&caller).await.unwrap();
        assert_eq!(rows.len(), 1);
        match &rows[0] {
            HistoryRow::Completed { cost, exited_at, .. } => {
                assert!(*cost > 0.0);
                assert!(exited_at.timestamp() > 0);
            }
            other => panic!("expected completed row, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn open_session_shows_as_active_row() {
        let (history, occupancy, lot_id) = fixture().await;
        let caller = Caller::user("u1", "alice");

        let ticket = occupancy.occupy(&caller, lot_id, 2, "V-9").await.unwrap();

        let rows = history.history_for(&caller).await.unwrap();
        assert_eq!(rows.len(), 1);
        match &rows[0] {
            HistoryRow::Active {
                reservation_id,
                slot_number,
                vehicle_id,
                lot_name,
                ..
            } => {
                assert_eq!(*reservation_id, ticket.reservation_id);
                assert_eq!(*slot_number, 2);
                assert_eq!(vehicle_id.as_deref(), Some("V-9"));
                assert_eq!(lot_name.as_str(), "Central");
            }
            other => panic!("expected active row, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn summary_aggregates_cost_hours_and_locations() {
        let (history, occupancy, lot_id) = fixture().await;
        let caller = Caller::user("u1", "alice");

        occupancy.occupy(&caller, lot_id, 1, "V-1").await.unwrap();
        occupancy.release(&caller, lot_id, 1).await.unwrap();
        occupancy.occupy(&caller, lot_id, 2, "V-1").await.unwrap();

        let summary = history.summary_for(&caller).await.unwrap();
        assert_eq!(summary.completed_sessions, 1);
        assert_eq!(summary.total_cost, 10.0); // one floored hour at $10/h
        assert_eq!(summary.total_hours, 1.0);
        assert_eq!(summary.distinct_locations, 1);
        assert_eq!(summary.active_reservations, 1);
    }

    #[tokio::test]
    async fn admin_summary_reports_utilization() {
        let (history, occupancy, lot_id) = fixture().await;
        let caller = Caller::user("u1", "alice");
        occupancy.occupy(&caller, lot_id, 1, "V-1").await.unwrap();

        let summary = history.admin_summary(&Caller::admin("a1", "root")).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].occupied, 1);
        assert_eq!(summary[0].total, 3);
        assert!((summary[0].utilization - 1.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn admin_summary_requires_admin() {
        let (history, _, _) = fixture().await;
        let err = history
            .admin_summary(&Caller::user("u1", "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
