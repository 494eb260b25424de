//! In-memory storage implementation.
//!
//! One mutex guards the whole state, so every trait method - in
//! particular the guarded engine operations - executes as a serializable
//! unit, matching the transactional semantics of the SQL implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    DomainError, DomainResult, ExportStatus, ExportTask, Lot, ReminderLog, Reservation, Spot,
    SpotStatus, Storage, UsageLogEntry, User,
};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    lots: HashMap<i64, Lot>,
    spots: HashMap<i64, Spot>,
    reservations: HashMap<i64, Reservation>,
    usage: Vec<UsageLogEntry>,
    export_tasks: HashMap<i64, ExportTask>,
    reminder_logs: Vec<ReminderLog>,
    next_lot_id: i64,
    next_spot_id: i64,
    next_reservation_id: i64,
    next_usage_id: i64,
    next_export_id: i64,
    next_reminder_id: i64,
}

/// In-memory storage for tests and local development.
pub struct InMemoryStorage {
    inner: Mutex<Inner>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn occupied_in_lot(&self, lot_id: i64) -> u64 {
        self.spots
            .values()
            .filter(|s| s.lot_id == lot_id && s.is_occupied())
            .count() as u64
    }

    fn insert_spot_rows(&mut self, spots: Vec<Spot>) {
        for mut spot in spots {
            self.next_spot_id += 1;
            spot.id = self.next_spot_id;
            self.spots.insert(spot.id, spot);
        }
    }

    fn apply_renumber(&mut self, assignments: &[(i64, i32)]) -> DomainResult<()> {
        for (id, number) in assignments {
            let spot = self
                .spots
                .get_mut(id)
                .ok_or_else(|| DomainError::not_found("Spot", "id", id))?;
            spot.number = *number;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    // ── Users ───────────────────────────────────────────────────

    async fn insert_user(&self, user: User) -> DomainResult<User> {
        let mut inner = self.lock();
        if inner
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(DomainError::Conflict(
                "username or email already exists".into(),
            ));
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.lock().users.get(id).cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> DomainResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == login || u.email == login)
            .cloned())
    }

    async fn update_user(&self, user: User) -> DomainResult<()> {
        let mut inner = self.lock();
        if !inner.users.contains_key(&user.id) {
            return Err(DomainError::not_found("User", "id", &user.id));
        }
        inner.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self.lock().users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn count_users(&self) -> DomainResult<u64> {
        Ok(self.lock().users.len() as u64)
    }

    // ── Lots ────────────────────────────────────────────────────

    async fn insert_lot_with_spots(&self, mut lot: Lot, spots: Vec<Spot>) -> DomainResult<Lot> {
        let mut inner = self.lock();
        inner.next_lot_id += 1;
        lot.id = inner.next_lot_id;
        let spots = spots
            .into_iter()
            .map(|mut s| {
                s.lot_id = lot.id;
                s
            })
            .collect();
        inner.lots.insert(lot.id, lot.clone());
        inner.insert_spot_rows(spots);
        Ok(lot)
    }

    async fn get_lot(&self, id: i64) -> DomainResult<Option<Lot>> {
        Ok(self.lock().lots.get(&id).cloned())
    }

    async fn update_lot(&self, lot: Lot) -> DomainResult<()> {
        let mut inner = self.lock();
        if !inner.lots.contains_key(&lot.id) {
            return Err(DomainError::not_found("Lot", "id", lot.id));
        }
        inner.lots.insert(lot.id, lot);
        Ok(())
    }

    async fn list_lots(&self) -> DomainResult<Vec<Lot>> {
        let mut lots: Vec<Lot> = self.lock().lots.values().cloned().collect();
        lots.sort_by_key(|l| l.id);
        Ok(lots)
    }

    async fn delete_lot(&self, id: i64) -> DomainResult<()> {
        let mut inner = self.lock();
        if !inner.lots.contains_key(&id) {
            return Err(DomainError::not_found("Lot", "id", id));
        }
        if inner.occupied_in_lot(id) > 0 {
            return Err(DomainError::Conflict(
                "cannot delete lot with occupied spots".into(),
            ));
        }
        inner.lots.remove(&id);
        inner.spots.retain(|_, s| s.lot_id != id);
        // the usage ledger outlives the lot
        Ok(())
    }

    // ── Spots ───────────────────────────────────────────────────

    async fn get_spot(&self, id: i64) -> DomainResult<Option<Spot>> {
        Ok(self.lock().spots.get(&id).cloned())
    }

    async fn find_spot(&self, lot_id: i64, number: i32) -> DomainResult<Option<Spot>> {
        Ok(self
            .lock()
            .spots
            .values()
            .find(|s| s.lot_id == lot_id && s.number == number)
            .cloned())
    }

    async fn list_spots(&self, lot_id: i64) -> DomainResult<Vec<Spot>> {
        let mut spots: Vec<Spot> = self
            .lock()
            .spots
            .values()
            .filter(|s| s.lot_id == lot_id)
            .cloned()
            .collect();
        spots.sort_by_key(|s| s.number);
        Ok(spots)
    }

    async fn count_spots(&self, lot_id: i64) -> DomainResult<u64> {
        Ok(self
            .lock()
            .spots
            .values()
            .filter(|s| s.lot_id == lot_id)
            .count() as u64)
    }

    async fn count_occupied(&self, lot_id: i64) -> DomainResult<u64> {
        Ok(self.lock().occupied_in_lot(lot_id))
    }

    async fn insert_spots(&self, spots: Vec<Spot>) -> DomainResult<()> {
        self.lock().insert_spot_rows(spots);
        Ok(())
    }

    async fn remove_spot(
        &self,
        lot_id: i64,
        spot_id: i64,
        renumber: Vec<(i64, i32)>,
    ) -> DomainResult<()> {
        let mut inner = self.lock();
        let stored = inner
            .spots
            .get(&spot_id)
            .ok_or_else(|| DomainError::not_found("Spot", "id", spot_id))?;
        if stored.lot_id != lot_id {
            return Err(DomainError::not_found("Spot", "id", spot_id));
        }
        if stored.is_occupied() {
            return Err(DomainError::Conflict(
                "cannot delete an occupied spot".into(),
            ));
        }
        inner.spots.remove(&spot_id);
        inner.apply_renumber(&renumber)
    }

    async fn apply_resize(
        &self,
        lot: Lot,
        create: Vec<Spot>,
        remove_ids: Vec<i64>,
        renumber: Vec<(i64, i32)>,
    ) -> DomainResult<()> {
        let mut inner = self.lock();
        if !inner.lots.contains_key(&lot.id) {
            return Err(DomainError::not_found("Lot", "id", lot.id));
        }
        // guard before touching anything: every removal target must still
        // be an Available spot of this lot
        for id in &remove_ids {
            match inner.spots.get(id) {
                Some(s) if s.lot_id == lot.id && !s.is_occupied() => {}
                Some(_) => {
                    return Err(DomainError::Conflict(
                        "spot selected for removal is no longer available".into(),
                    ))
                }
                None => return Err(DomainError::not_found("Spot", "id", id)),
            }
        }
        inner.lots.insert(lot.id, lot);
        for id in &remove_ids {
            inner.spots.remove(id);
        }
        inner.insert_spot_rows(create);
        inner.apply_renumber(&renumber)
    }

    // ── Occupancy engine ────────────────────────────────────────

    async fn apply_occupy(
        &self,
        spot: Spot,
        mut reservation: Reservation,
    ) -> DomainResult<Reservation> {
        let mut inner = self.lock();
        let stored = inner
            .spots
            .get(&spot.id)
            .ok_or_else(|| DomainError::not_found("Spot", "id", spot.id))?;
        if stored.status != SpotStatus::Available {
            return Err(DomainError::Conflict(format!(
                "slot {} is already occupied",
                stored.number
            )));
        }
        inner.next_reservation_id += 1;
        reservation.id = inner.next_reservation_id;
        inner.spots.insert(spot.id, spot);
        inner.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn apply_release(
        &self,
        spot: Spot,
        reservation: Reservation,
        mut entry: UsageLogEntry,
    ) -> DomainResult<UsageLogEntry> {
        let mut inner = self.lock();
        let stored_spot = inner
            .spots
            .get(&spot.id)
            .ok_or_else(|| DomainError::not_found("Spot", "id", spot.id))?;
        if stored_spot.status != SpotStatus::Occupied {
            return Err(DomainError::Conflict(format!(
                "slot {} is not occupied",
                stored_spot.number
            )));
        }
        let stored_reservation = inner
            .reservations
            .get(&reservation.id)
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation.id))?;
        if !stored_reservation.is_open() {
            return Err(DomainError::Conflict(format!(
                "reservation {} is already closed",
                reservation.id
            )));
        }
        inner.next_usage_id += 1;
        entry.id = inner.next_usage_id;
        inner.spots.insert(spot.id, spot);
        inner.reservations.insert(reservation.id, reservation);
        inner.usage.push(entry.clone());
        Ok(entry)
    }

    // ── Reservations ────────────────────────────────────────────

    async fn get_reservation(&self, id: i64) -> DomainResult<Option<Reservation>> {
        Ok(self.lock().reservations.get(&id).cloned())
    }

    async fn find_open_reservation(&self, spot_id: i64) -> DomainResult<Option<Reservation>> {
        Ok(self
            .lock()
            .reservations
            .values()
            .find(|r| r.spot_id == spot_id && r.is_open())
            .cloned())
    }

    async fn list_open_reservations_for_user(
        &self,
        user_id: &str,
    ) -> DomainResult<Vec<Reservation>> {
        let mut open: Vec<Reservation> = self
            .lock()
            .reservations
            .values()
            .filter(|r| r.user_id == user_id && r.is_open())
            .cloned()
            .collect();
        open.sort_by_key(|r| r.id);
        Ok(open)
    }

    // ── Usage ledger ────────────────────────────────────────────

    async fn list_usage_for_user(&self, user_id: &str) -> DomainResult<Vec<UsageLogEntry>> {
        let mut entries: Vec<UsageLogEntry> = self
            .lock()
            .usage
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.exited_at.cmp(&a.exited_at));
        Ok(entries)
    }

    async fn list_all_usage(&self) -> DomainResult<Vec<UsageLogEntry>> {
        let mut entries = self.lock().usage.clone();
        entries.sort_by(|a, b| b.exited_at.cmp(&a.exited_at));
        Ok(entries)
    }

    // ── Export tasks ────────────────────────────────────────────

    async fn insert_export_task(&self, mut task: ExportTask) -> DomainResult<ExportTask> {
        let mut inner = self.lock();
        inner.next_export_id += 1;
        task.id = inner.next_export_id;
        inner.export_tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_export_task(&self, id: i64) -> DomainResult<Option<ExportTask>> {
        Ok(self.lock().export_tasks.get(&id).cloned())
    }

    async fn update_export_task(&self, task: ExportTask) -> DomainResult<()> {
        let mut inner = self.lock();
        if !inner.export_tasks.contains_key(&task.id) {
            return Err(DomainError::not_found("ExportTask", "id", task.id));
        }
        inner.export_tasks.insert(task.id, task);
        Ok(())
    }

    async fn claim_pending_export_task(&self) -> DomainResult<Option<ExportTask>> {
        let mut inner = self.lock();
        let oldest = inner
            .export_tasks
            .values()
            .filter(|t| t.status == ExportStatus::Pending)
            .min_by_key(|t| t.id)
            .map(|t| t.id);
        let Some(id) = oldest else {
            return Ok(None);
        };
        let task = inner
            .export_tasks
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("ExportTask", "id", id))?;
        task.status = ExportStatus::Processing;
        Ok(Some(task.clone()))
    }

    // ── Reminders ───────────────────────────────────────────────

    async fn insert_reminder_log(&self, mut log: ReminderLog) -> DomainResult<ReminderLog> {
        let mut inner = self.lock();
        inner.next_reminder_id += 1;
        log.id = inner.next_reminder_id;
        inner.reminder_logs.push(log.clone());
        Ok(log)
    }

    async fn last_reminder_sent(
        &self,
        reminder_type: &str,
    ) -> DomainResult<Option<DateTime<Utc>>> {
        Ok(self
            .lock()
            .reminder_logs
            .iter()
            .filter(|l| l.reminder_type == reminder_type)
            .map(|l| l.sent_at)
            .max())
    }
}

// ── Tests ──────────────────────────────────────────────────────
