//! Storage port.
//!
//! One trait covers all persistence. Plain reads and writes are
//! straightforward; every state-changing engine operation has a *guarded*
//! method that re-validates the relevant precondition inside a single
//! transaction and commits all of its writes or none of them. Services
//! compute transitions against a snapshot; a snapshot gone stale by the
//! time of the guarded call surfaces as `Conflict`, never as a lost
//! update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    DomainResult, ExportTask, Lot, ReminderLog, Reservation, Spot, UsageLogEntry, User,
};

#[async_trait]
pub trait Storage: Send + Sync {
    // ── Users ───────────────────────────────────────────────────

    async fn insert_user(&self, user: User) -> DomainResult<User>;
    async fn get_user(&self, id: &str) -> DomainResult<Option<User>>;
    /// Lookup by username or email, for sign-in and duplicate checks.
    async fn find_user_by_login(&self, login: &str) -> DomainResult<Option<User>>;
    async fn update_user(&self, user: User) -> DomainResult<()>;
    async fn list_users(&self) -> DomainResult<Vec<User>>;
    async fn count_users(&self) -> DomainResult<u64>;

    // ── Lots ────────────────────────────────────────────────────

    /// Insert a lot together with its initial spot set, atomically.
    /// Returns the lot with its assigned id.
    async fn insert_lot_with_spots(&self, lot: Lot, spots: Vec<Spot>) -> DomainResult<Lot>;
    async fn get_lot(&self, id: i64) -> DomainResult<Option<Lot>>;
    async fn update_lot(&self, lot: Lot) -> DomainResult<()>;
    async fn list_lots(&self) -> DomainResult<Vec<Lot>>;
    /// Delete a lot and its spots. Guard: refuses with `Conflict` while
    /// any spot of the lot is occupied. Usage-log entries referencing the
    /// lot are kept.
    async fn delete_lot(&self, id: i64) -> DomainResult<()>;

    // ── Spots ───────────────────────────────────────────────────

    async fn get_spot(&self, id: i64) -> DomainResult<Option<Spot>>;
    async fn find_spot(&self, lot_id: i64, number: i32) -> DomainResult<Option<Spot>>;
    /// All spots of a lot in ascending slot-number order.
    async fn list_spots(&self, lot_id: i64) -> DomainResult<Vec<Spot>>;
    async fn count_spots(&self, lot_id: i64) -> DomainResult<u64>;
    async fn count_occupied(&self, lot_id: i64) -> DomainResult<u64>;
    async fn insert_spots(&self, spots: Vec<Spot>) -> DomainResult<()>;
    /// Remove one spot and apply the renumber assignments in the same
    /// transaction. Guard: the spot must still be Available.
    async fn remove_spot(
        &self,
        lot_id: i64,
        spot_id: i64,
        renumber: Vec<(i64, i32)>,
    ) -> DomainResult<()>;
    /// Apply a capacity reconciliation plan: persist the new capacity,
    /// create and remove spots, renumber survivors, all in one
    /// transaction. Guard: every removal target must still be Available,
    /// otherwise nothing is applied.
    async fn apply_resize(
        &self,
        lot: Lot,
        create: Vec<Spot>,
        remove_ids: Vec<i64>,
        renumber: Vec<(i64, i32)>,
    ) -> DomainResult<()>;

    // ── Occupancy engine ────────────────────────────────────────

    /// Commit an Available → Occupied transition plus its open
    /// reservation. Guard: the stored spot must still be Available, so of
    /// two concurrent occupy calls exactly one commits. Returns the
    /// reservation with its assigned id.
    async fn apply_occupy(&self, spot: Spot, reservation: Reservation)
        -> DomainResult<Reservation>;
    /// Commit an Occupied → Available transition: usage-log insert,
    /// reservation close and spot reset as a single unit. Guard: the
    /// stored spot must still be Occupied and the reservation still open.
    async fn apply_release(
        &self,
        spot: Spot,
        reservation: Reservation,
        entry: UsageLogEntry,
    ) -> DomainResult<UsageLogEntry>;

    // ── Reservations ────────────────────────────────────────────

    async fn get_reservation(&self, id: i64) -> DomainResult<Option<Reservation>>;
    async fn find_open_reservation(&self, spot_id: i64) -> DomainResult<Option<Reservation>>;
    async fn list_open_reservations_for_user(
        &self,
        user_id: &str,
    ) -> DomainResult<Vec<Reservation>>;

    // ── Usage ledger ────────────────────────────────────────────

    /// A user's completed episodes, newest exit first.
    async fn list_usage_for_user(&self, user_id: &str) -> DomainResult<Vec<UsageLogEntry>>;
    async fn list_all_usage(&self) -> DomainResult<Vec<UsageLogEntry>>;

    // ── Export tasks ────────────────────────────────────────────

    async fn insert_export_task(&self, task: ExportTask) -> DomainResult<ExportTask>;
    async fn get_export_task(&self, id: i64) -> DomainResult<Option<ExportTask>>;
    async fn update_export_task(&self, task: ExportTask) -> DomainResult<()>;
    /// Atomically claim the oldest pending task, flipping it to
    /// Processing so concurrent workers never double-claim.
    async fn claim_pending_export_task(&self) -> DomainResult<Option<ExportTask>>;

    // ── Reminders ───────────────────────────────────────────────

    async fn insert_reminder_log(&self, log: ReminderLog) -> DomainResult<ReminderLog>;
    async fn last_reminder_sent(
        &self,
        reminder_type: &str,
    ) -> DomainResult<Option<DateTime<Utc>>>;
}
