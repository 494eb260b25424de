//! Lot administration: lot CRUD, the spot registry and the capacity
//! reconciler.
//!
//! Reconciliation plans are computed by the pure functions in
//! `domain::capacity`; the guarded storage calls re-validate inside one
//! transaction so a concurrent occupy between planning and commit fails
//! the whole operation instead of deleting an occupied spot.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    plan_renumber, plan_resize, Caller, DomainError, DomainResult, Lot, Spot, Storage,
};
use crate::infrastructure::cache::{keys, CacheEntity, CacheLayer, TTL_LOTS};
use crate::notifications::events::{LotAddedEvent, LotRemovedEvent};
use crate::notifications::{Dispatcher, Event};

/// Attributes for creating a lot.
#[derive(Debug, Clone)]
pub struct NewLot {
    pub name: String,
    pub address: String,
    pub pin_code: String,
    pub hourly_price: f64,
    pub capacity: i32,
}

/// Partial update of a lot; `capacity` triggers a resize.
#[derive(Debug, Clone, Default)]
pub struct LotUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
    pub hourly_price: Option<f64>,
    pub capacity: Option<i32>,
}

/// A lot joined with its spots, as served to listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotWithSpots {
    pub lot: Lot,
    pub spots: Vec<Spot>,
}

pub struct LotService {
    storage: Arc<dyn Storage>,
    cache: CacheLayer,
    dispatcher: Dispatcher,
}

impl LotService {
    pub fn new(storage: Arc<dyn Storage>, cache: CacheLayer, dispatcher: Dispatcher) -> Self {
        Self {
            storage,
            cache,
            dispatcher,
        }
    }

    /// Create a lot together with its initial spots, numbered
    /// `1..=capacity`, all Available.
    pub async fn create_lot(&self, caller: &Caller, new: NewLot) -> DomainResult<Lot> {
        caller.require_admin()?;

        let lot = Lot::new(
            new.name,
            new.address,
            new.pin_code,
            new.hourly_price,
            new.capacity,
        );
        lot.validate()?;

        let spots = (1..=new.capacity).map(|n| Spot::available(0, n)).collect();
        let lot = self.storage.insert_lot_with_spots(lot, spots).await?;

        info!(lot_id = lot.id, name = %lot.name, capacity = lot.capacity, "lot created");

        self.cache
            .invalidate(&[CacheEntity::Lot(lot.id), CacheEntity::AdminSummary])
            .await;
        self.dispatcher.enqueue(
            Event::LotAdded(LotAddedEvent {
                lot_id: lot.id,
                name: lot.name.clone(),
                capacity: lot.capacity,
                timestamp: Utc::now(),
            }),
            Duration::ZERO,
        );

        Ok(lot)
    }

    /// Update lot attributes. A changed capacity delegates to
    /// [`Self::resize`].
    pub async fn update_lot(
        &self,
        caller: &Caller,
        lot_id: i64,
        update: LotUpdate,
    ) -> DomainResult<Lot> {
        caller.require_admin()?;

        let mut lot = self.require_lot(lot_id).await?;
        if let Some(name) = update.name {
            lot.name = name;
        }
        if let Some(address) = update.address {
            lot.address = address;
        }
        if let Some(pin_code) = update.pin_code {
            lot.pin_code = pin_code;
        }
        if let Some(price) = update.hourly_price {
            lot.hourly_price = price;
        }
        lot.validate()?;

        match update.capacity {
            Some(capacity) if capacity != lot.capacity => {
                self.resize_inner(lot, capacity).await
            }
            _ => {
                self.storage.update_lot(lot.clone()).await?;
                self.cache
                    .invalidate(&[CacheEntity::Lot(lot_id), CacheEntity::AdminSummary])
                    .await;
                Ok(lot)
            }
        }
    }

    /// Reconcile a lot's spot set against a requested capacity.
    ///
    /// Either every step commits (spot creation/removal, renumbering,
    /// the persisted capacity) or none do.
    pub async fn resize(
        &self,
        caller: &Caller,
        lot_id: i64,
        new_capacity: i32,
    ) -> DomainResult<Lot> {
        caller.require_admin()?;
        let lot = self.require_lot(lot_id).await?;
        self.resize_inner(lot, new_capacity).await
    }

    async fn resize_inner(&self, mut lot: Lot, new_capacity: i32) -> DomainResult<Lot> {
        let spots = self.storage.list_spots(lot.id).await?;
        let plan = plan_resize(&spots, new_capacity)?;

        lot.capacity = new_capacity;
        let create: Vec<Spot> = plan
            .create_numbers
            .iter()
            .map(|n| Spot::available(lot.id, *n))
            .collect();

        self.storage
            .apply_resize(lot.clone(), create, plan.remove_ids.clone(), plan.renumber)
            .await?;

        info!(
            lot_id = lot.id,
            capacity = new_capacity,
            created = plan.create_numbers.len(),
            removed = plan.remove_ids.len(),
            "lot resized"
        );

        self.cache
            .invalidate(&[CacheEntity::Lot(lot.id), CacheEntity::AdminSummary])
            .await;

        Ok(lot)
    }

    /// Delete a lot and all of its spots. Refused while any spot is
    /// occupied; the usage ledger keeps its entries.
    pub async fn delete_lot(&self, caller: &Caller, lot_id: i64) -> DomainResult<()> {
        caller.require_admin()?;

        let lot = self.require_lot(lot_id).await?;
        self.storage.delete_lot(lot_id).await?;

        info!(lot_id, name = %lot.name, "lot deleted");

        self.cache
            .invalidate(&[CacheEntity::Lot(lot_id), CacheEntity::AdminSummary])
            .await;
        self.dispatcher.enqueue(
            Event::LotRemoved(LotRemovedEvent {
                lot_id,
                name: lot.name,
                timestamp: Utc::now(),
            }),
            Duration::ZERO,
        );

        Ok(())
    }

    /// Append one Available spot, numbered after the current highest.
    /// Refused beyond the configured capacity.
    pub async fn add_slot(&self, caller: &Caller, lot_id: i64) -> DomainResult<i32> {
        caller.require_admin()?;

        let lot = self.require_lot(lot_id).await?;
        let count = self.storage.count_spots(lot_id).await? as i32;
        if count >= lot.capacity {
            return Err(DomainError::Validation("maximum slots reached".into()));
        }

        let number = count + 1;
        self.storage
            .insert_spots(vec![Spot::available(lot_id, number)])
            .await?;

        self.cache
            .invalidate(&[CacheEntity::Lot(lot_id), CacheEntity::AdminSummary])
            .await;

        Ok(number)
    }

    /// Delete one spot by slot number and renumber the survivors back to
    /// a contiguous 1..N range. Occupied spots cannot be deleted.
    pub async fn delete_slot(
        &self,
        caller: &Caller,
        lot_id: i64,
        slot_number: i32,
    ) -> DomainResult<()> {
        caller.require_admin()?;

        self.require_lot(lot_id).await?;
        let spot = self
            .storage
            .find_spot(lot_id, slot_number)
            .await?
            .ok_or_else(|| DomainError::not_found("Spot", "number", slot_number))?;
        if spot.is_occupied() {
            return Err(DomainError::Conflict(
                "cannot delete an occupied slot".into(),
            ));
        }

        let survivors: Vec<Spot> = self
            .storage
            .list_spots(lot_id)
            .await?
            .into_iter()
            .filter(|s| s.id != spot.id)
            .collect();
        let renumber = plan_renumber(&survivors);

        self.storage.remove_spot(lot_id, spot.id, renumber).await?;

        self.cache
            .invalidate(&[CacheEntity::Lot(lot_id), CacheEntity::AdminSummary])
            .await;

        Ok(())
    }

    pub async fn get_lot(&self, caller: &Caller, lot_id: i64) -> DomainResult<LotWithSpots> {
        caller.require_user()?;
        let lot = self.require_lot(lot_id).await?;
        let spots = self.storage.list_spots(lot_id).await?;
        Ok(LotWithSpots { lot, spots })
    }

    /// All lots with their spots. Read-through cached; every lot/spot
    /// mutation invalidates the key.
    pub async fn list_lots(&self, caller: &Caller) -> DomainResult<Vec<LotWithSpots>> {
        caller.require_user()?;

        let key = keys::lots_all();
        if let Some(cached) = self.cache.get_json::<Vec<LotWithSpots>>(&key).await {
            return Ok(cached);
        }

        let mut listings = Vec::new();
        for lot in self.storage.list_lots().await? {
            let spots = self.storage.list_spots(lot.id).await?;
            listings.push(LotWithSpots { lot, spots });
        }

        self.cache.set_json(&key, &listings, TTL_LOTS).await;
        Ok(listings)
    }

    /// Case-insensitive substring search over name, address and pin code.
    pub async fn search_lots(&self, caller: &Caller, query: &str) -> DomainResult<Vec<Lot>> {
        caller.require_user()?;

        let needle = query.trim().to_lowercase();
        let lots = self.storage.list_lots().await?;
        if needle.is_empty() {
            return Ok(lots);
        }
        Ok(lots
            .into_iter()
            .filter(|l| {
                l.name.to_lowercase().contains(&needle)
                    || l.address.to_lowercase().contains(&needle)
                    || l.pin_code.to_lowercase().contains(&needle)
            })
            .collect())
    }

    async fn require_lot(&self, lot_id: i64) -> DomainResult<Lot> {
        self.storage
            .get_lot(lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lot", "id", lot_id))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpotStatus;
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::notifications::create_event_bus;

    fn admin() -> Caller {
        Caller::admin("a1", "root")
    }

    fn service() -> (LotService, Arc<InMemoryStorage>) {
        let storage = Arc::new(InMemoryStorage::new());
        let service = LotService::new(
            storage.clone(),
            CacheLayer::disabled(),
            Dispatcher::new(create_event_bus()),
        );
        (service, storage)
    }

    fn new_lot(capacity: i32) -> NewLot {
        NewLot {
            name: "Central Garage".into(),
            address: "1 Main St".into(),
            pin_code: "110001".into(),
            hourly_price: 10.0,
            capacity,
        }
    }

    async fn occupy_slot(storage: &InMemoryStorage, lot_id: i64, number: i32, user: &str) {
        let spot = storage.find_spot(lot_id, number).await.unwrap().unwrap();
        let mut taken = spot.clone();
        taken.occupy(user, user, "V-1", Utc::now()).unwrap();
        storage
            .apply_occupy(
                taken,
                crate::domain::Reservation::open(spot.id, user, Utc::now()),
            )
            .await
            .unwrap();
    }

    fn numbers(spots: &[Spot]) -> Vec<i32> {
        spots.iter().map(|s| s.number).collect()
    }

    #[tokio::test]
    async fn create_lot_seeds_contiguous_spots() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(4)).await.unwrap();

        let spots = storage.list_spots(lot.id).await.unwrap();
        assert_eq!(numbers(&spots), vec![1, 2, 3, 4]);
        assert!(spots.iter().all(|s| s.status == SpotStatus::Available));
    }

    #[tokio::test]
    async fn create_lot_requires_admin() {
        let (service, _) = service();
        let err = service
            .create_lot(&Caller::user("u1", "alice"), new_lot(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn resize_up_creates_spots_and_persists_capacity() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(2)).await.unwrap();

        let resized = service.resize(&admin(), lot.id, 5).await.unwrap();
        assert_eq!(resized.capacity, 5);
        assert_eq!(
            numbers(&storage.list_spots(lot.id).await.unwrap()),
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(storage.get_lot(lot.id).await.unwrap().unwrap().capacity, 5);
    }

    #[tokio::test]
    async fn resize_down_removes_available_and_renumbers() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(5)).await.unwrap();
        occupy_slot(&storage, lot.id, 5, "u1").await;

        service.resize(&admin(), lot.id, 3).await.unwrap();

        let spots = storage.list_spots(lot.id).await.unwrap();
        // occupied #5 survives, renumbered to 3
        assert_eq!(numbers(&spots), vec![1, 2, 3]);
        assert!(spots[2].is_occupied());
        assert_eq!(storage.count_occupied(lot.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn resize_below_occupied_fails_without_changes() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(3)).await.unwrap();
        occupy_slot(&storage, lot.id, 1, "u1").await;
        occupy_slot(&storage, lot.id, 2, "u2").await;

        let err = service.resize(&admin(), lot.id, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        assert_eq!(storage.count_spots(lot.id).await.unwrap(), 3);
        assert_eq!(storage.get_lot(lot.id).await.unwrap().unwrap().capacity, 3);
    }

    #[tokio::test]
    async fn delete_lot_with_occupied_spot_is_conflict() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(2)).await.unwrap();
        occupy_slot(&storage, lot.id, 1, "u1").await;

        let err = service.delete_lot(&admin(), lot.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(storage.get_lot(lot.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_empty_lot_removes_spots() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(2)).await.unwrap();

        service.delete_lot(&admin(), lot.id).await.unwrap();
        assert!(storage.get_lot(lot.id).await.unwrap().is_none());
        assert_eq!(storage.count_spots(lot.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn add_slot_respects_capacity() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(2)).await.unwrap();
        service.delete_slot(&admin(), lot.id, 2).await.unwrap();

        assert_eq!(service.add_slot(&admin(), lot.id).await.unwrap(), 2);
        let err = service.add_slot(&admin(), lot.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(storage.count_spots(lot.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_slot_renumbers_survivors() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(4)).await.unwrap();

        service.delete_slot(&admin(), lot.id, 2).await.unwrap();

        let spots = storage.list_spots(lot.id).await.unwrap();
        assert_eq!(numbers(&spots), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn delete_occupied_slot_is_conflict() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(2)).await.unwrap();
        occupy_slot(&storage, lot.id, 2, "u1").await;

        let err = service.delete_slot(&admin(), lot.id, 2).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(storage.count_spots(lot.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn capacity_update_delegates_to_resize() {
        let (service, storage) = service();
        let lot = service.create_lot(&admin(), new_lot(2)).await.unwrap();

        let updated = service
            .update_lot(
                &admin(),
                lot.id,
                LotUpdate {
                    hourly_price: Some(12.5),
                    capacity: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.hourly_price, 12.5);
        assert_eq!(updated.capacity, 4);
        assert_eq!(storage.count_spots(lot.id).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn search_matches_name_address_and_pin() {
        let (service, _) = service();
        service.create_lot(&admin(), new_lot(1)).await.unwrap();
        service
            .create_lot(
                &admin(),
                NewLot {
                    name: "Airport Lot".into(),
                    address: "Terminal Rd".into(),
                    pin_code: "560017".into(),
                    hourly_price: 8.0,
                    capacity: 1,
                },
            )
            .await
            .unwrap();

        let caller = Caller::user("u1", "alice");
        assert_eq!(service.search_lots(&caller, "airport").await.unwrap().len(), 1);
        assert_eq!(service.search_lots(&caller, "main st").await.unwrap().len(), 1);
        assert_eq!(service.search_lots(&caller, "560017").await.unwrap().len(), 1);
        assert_eq!(service.search_lots(&caller, "").await.unwrap().len(), 2);
        assert!(service.search_lots(&caller, "nowhere").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_lots_uses_cache_after_first_read() {
        use crate::infrastructure::cache::{Cache, InMemoryCache};

        let storage = Arc::new(InMemoryStorage::new());
        let cache_backend = Arc::new(InMemoryCache::new());
        let service = LotService::new(
            storage.clone(),
            CacheLayer::new(cache_backend.clone()),
            Dispatcher::new(create_event_bus()),
        );

        service.create_lot(&admin(), new_lot(1)).await.unwrap();
        let caller = Caller::user("u1", "alice");
        let first = service.list_lots(&caller).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(cache_backend.get(&keys::lots_all()).await.is_some());

        // a lot mutation invalidates the listing key
        service.create_lot(&admin(), new_lot(1)).await.unwrap();
        assert!(cache_backend.get(&keys::lots_all()).await.is_none());
        assert_eq!(service.list_lots(&caller).await.unwrap().len(), 2);
    }
}
