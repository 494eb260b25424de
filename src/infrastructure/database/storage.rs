//! SeaORM implementation of the storage port.
//!
//! Guarded engine operations run inside a database transaction and
//! re-check their precondition on the stored row before writing, so a
//! transition computed against a stale snapshot rolls back with
//! `Conflict`. SQLite serializes writers; on PostgreSQL the re-check
//! inside the transaction provides the same lost-update protection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::debug;

use crate::domain::{
    DomainError, DomainResult, ExportStatus, ExportTask, Lot, ReminderLog, Reservation, Spot,
    SpotStatus, Storage, UsageLogEntry, User,
};

use super::entities::{export_task, lot, reminder_log, reservation, spot, usage_log, user};

pub struct DatabaseStorage {
    db: DatabaseConnection,
}

impl DatabaseStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

fn lot_to_domain(m: lot::Model) -> Lot {
    Lot {
        id: m.id,
        name: m.name,
        address: m.address,
        pin_code: m.pin_code,
        hourly_price: m.hourly_price,
        capacity: m.capacity,
        created_at: m.created_at,
    }
}

fn lot_to_active(l: &Lot) -> lot::ActiveModel {
    lot::ActiveModel {
        id: Set(l.id),
        name: Set(l.name.clone()),
        address: Set(l.address.clone()),
        pin_code: Set(l.pin_code.clone()),
        hourly_price: Set(l.hourly_price),
        capacity: Set(l.capacity),
        created_at: Set(l.created_at),
    }
}

fn spot_to_domain(m: spot::Model) -> Spot {
    Spot {
        id: m.id,
        lot_id: m.lot_id,
        number: m.number,
        status: SpotStatus::from_str(&m.status),
        vehicle_id: m.vehicle_id,
        occupant_id: m.occupant_id,
        occupant_name: m.occupant_name,
        occupied_since: m.occupied_since,
    }
}

fn spot_to_active(s: &Spot) -> spot::ActiveModel {
    spot::ActiveModel {
        id: Set(s.id),
        lot_id: Set(s.lot_id),
        number: Set(s.number),
        status: Set(s.status.as_str().to_string()),
        vehicle_id: Set(s.vehicle_id.clone()),
        occupant_id: Set(s.occupant_id.clone()),
        occupant_name: Set(s.occupant_name.clone()),
        occupied_since: Set(s.occupied_since),
    }
}

fn spot_to_active_new(s: &Spot) -> spot::ActiveModel {
    let mut active = spot_to_active(s);
    active.id = NotSet;
    active
}

fn reservation_to_domain(m: reservation::Model) -> Reservation {
    Reservation {
        id: m.id,
        spot_id: m.spot_id,
        user_id: m.user_id,
        started_at: m.started_at,
        ended_at: m.ended_at,
        cost: m.cost,
    }
}

fn reservation_to_active(r: &Reservation) -> reservation::ActiveModel {
    reservation::ActiveModel {
        id: Set(r.id),
        spot_id: Set(r.spot_id),
        user_id: Set(r.user_id.clone()),
        started_at: Set(r.started_at),
        ended_at: Set(r.ended_at),
        cost: Set(r.cost),
    }
}

fn usage_to_domain(m: usage_log::Model) -> UsageLogEntry {
    UsageLogEntry {
        id: m.id,
        user_id: m.user_id,
        spot_id: m.spot_id,
        lot_id: m.lot_id,
        vehicle_id: m.vehicle_id,
        entered_at: m.entered_at,
        exited_at: m.exited_at,
        duration_hours: m.duration_hours,
        cost: m.cost,
        remarks: m.remarks,
    }
}

fn user_to_domain(m: user::Model) -> User {
    User {
        id: m.id,
        username: m.username,
        email: m.email,
        password_hash: m.password_hash,
        role: match m.role {
            user::UserRole::Admin => crate::domain::Role::Admin,
            user::UserRole::User => crate::domain::Role::User,
        },
        banned: m.banned,
        address: m.address,
        pin_code: m.pin_code,
        created_at: m.created_at,
    }
}

fn user_to_active(u: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(u.id.clone()),
        username: Set(u.username.clone()),
        email: Set(u.email.clone()),
        password_hash: Set(u.password_hash.clone()),
        role: Set(match u.role {
            crate::domain::Role::Admin => user::UserRole::Admin,
            crate::domain::Role::User => user::UserRole::User,
        }),
        banned: Set(u.banned),
        address: Set(u.address.clone()),
        pin_code: Set(u.pin_code.clone()),
        created_at: Set(u.created_at),
    }
}

fn export_to_domain(m: export_task::Model) -> ExportTask {
    ExportTask {
        id: m.id,
        user_id: m.user_id,
        scope_user_id: m.scope_user_id,
        status: ExportStatus::from_str(&m.status),
        created_at: m.created_at,
        completed_at: m.completed_at,
        download_link: m.download_link,
    }
}

fn export_to_active(t: &ExportTask) -> export_task::ActiveModel {
    export_task::ActiveModel {
        id: Set(t.id),
        user_id: Set(t.user_id.clone()),
        scope_user_id: Set(t.scope_user_id.clone()),
        status: Set(t.status.as_str().to_string()),
        created_at: Set(t.created_at),
        completed_at: Set(t.completed_at),
        download_link: Set(t.download_link.clone()),
    }
}

// ── Transaction-scoped helpers ──────────────────────────────────

async fn load_spot_for_update(
    txn: &DatabaseTransaction,
    spot_id: i64,
) -> DomainResult<spot::Model> {
    spot::Entity::find_by_id(spot_id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("Spot", "id", spot_id))
}

async fn renumber_in_txn(
    txn: &DatabaseTransaction,
    assignments: &[(i64, i32)],
) -> DomainResult<()> {
    // assignments only ever move numbers downward, in ascending target
    // order, so the unique (lot_id, number) index is never violated
    // mid-flight
    for (id, number) in assignments {
        let mut active: spot::ActiveModel = load_spot_for_update(txn, *id).await?.into();
        active.number = Set(*number);
        active.update(txn).await.map_err(db_err)?;
    }
    Ok(())
}

// ── Storage impl ────────────────────────────────────────────────

#[async_trait]
impl Storage for DatabaseStorage {
    // ── Users ───────────────────────────────────────────────────

    async fn insert_user(&self, u: User) -> DomainResult<User> {
        let existing = user::Entity::find()
            .filter(
                user::Column::Username
                    .eq(&u.username)
                    .or(user::Column::Email.eq(&u.email)),
            )
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(DomainError::Conflict(
                "username or email already exists".into(),
            ));
        }
        user_to_active(&u).insert(&self.db).await.map_err(db_err)?;
        Ok(u)
    }

    async fn get_user(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(user_to_domain))
    }

    async fn find_user_by_login(&self, login: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(
                user::Column::Username
                    .eq(login)
                    .or(user::Column::Email.eq(login)),
            )
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(user_to_domain))
    }

    async fn update_user(&self, u: User) -> DomainResult<()> {
        let existing = user::Entity::find_by_id(&u.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_none() {
            return Err(DomainError::not_found("User", "id", &u.id));
        }
        user_to_active(&u).update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let models = user::Entity::find()
            .order_by_asc(user::Column::Username)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(user_to_domain).collect())
    }

    async fn count_users(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }

    // ── Lots ────────────────────────────────────────────────────

    async fn insert_lot_with_spots(&self, lot: Lot, spots: Vec<Spot>) -> DomainResult<Lot> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let mut active = lot_to_active(&lot);
        active.id = NotSet;
        let inserted = active.insert(&txn).await.map_err(db_err)?;

        for mut s in spots {
            s.lot_id = inserted.id;
            spot_to_active_new(&s).insert(&txn).await.map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        debug!(lot_id = inserted.id, "lot inserted");
        Ok(lot_to_domain(inserted))
    }

    async fn get_lot(&self, id: i64) -> DomainResult<Option<Lot>> {
        let model = lot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(lot_to_domain))
    }

    async fn update_lot(&self, l: Lot) -> DomainResult<()> {
        let existing = lot::Entity::find_by_id(l.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_none() {
            return Err(DomainError::not_found("Lot", "id", l.id));
        }
        lot_to_active(&l).update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn list_lots(&self) -> DomainResult<Vec<Lot>> {
        let models = lot::Entity::find()
            .order_by_asc(lot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(lot_to_domain).collect())
    }

    async fn delete_lot(&self, id: i64) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = lot::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?;
        if existing.is_none() {
            return Err(DomainError::not_found("Lot", "id", id));
        }

        let occupied = spot::Entity::find()
            .filter(spot::Column::LotId.eq(id))
            .filter(spot::Column::Status.eq(SpotStatus::Occupied.as_str()))
            .count(&txn)
            .await
            .map_err(db_err)?;
        if occupied > 0 {
            return Err(DomainError::Conflict(
                "cannot delete lot with occupied spots".into(),
            ));
        }

        // spots go with the lot; the usage ledger is untouched
        spot::Entity::delete_many()
            .filter(spot::Column::LotId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        lot::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)
    }

    // ── Spots ───────────────────────────────────────────────────

    async fn get_spot(&self, id: i64) -> DomainResult<Option<Spot>> {
        let model = spot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(spot_to_domain))
    }

    async fn find_spot(&self, lot_id: i64, number: i32) -> DomainResult<Option<Spot>> {
        let model = spot::Entity::find()
            .filter(spot::Column::LotId.eq(lot_id))
            .filter(spot::Column::Number.eq(number))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(spot_to_domain))
    }

    async fn list_spots(&self, lot_id: i64) -> DomainResult<Vec<Spot>> {
        let models = spot::Entity::find()
            .filter(spot::Column::LotId.eq(lot_id))
            .order_by_asc(spot::Column::Number)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(spot_to_domain).collect())
    }

    async fn count_spots(&self, lot_id: i64) -> DomainResult<u64> {
        spot::Entity::find()
            .filter(spot::Column::LotId.eq(lot_id))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn count_occupied(&self, lot_id: i64) -> DomainResult<u64> {
        spot::Entity::find()
            .filter(spot::Column::LotId.eq(lot_id))
            .filter(spot::Column::Status.eq(SpotStatus::Occupied.as_str()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn insert_spots(&self, spots: Vec<Spot>) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        for s in &spots {
            spot_to_active_new(s).insert(&txn).await.map_err(db_err)?;
        }
        txn.commit().await.map_err(db_err)
    }

    async fn remove_spot(
        &self,
        lot_id: i64,
        spot_id: i64,
        renumber: Vec<(i64, i32)>,
    ) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let stored = load_spot_for_update(&txn, spot_id).await?;
        if stored.lot_id != lot_id {
            return Err(DomainError::not_found("Spot", "id", spot_id));
        }
        if stored.status == SpotStatus::Occupied.as_str() {
            return Err(DomainError::Conflict(
                "cannot delete an occupied spot".into(),
            ));
        }

        spot::Entity::delete_by_id(spot_id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        renumber_in_txn(&txn, &renumber).await?;

        txn.commit().await.map_err(db_err)
    }

    async fn apply_resize(
        &self,
        lot: Lot,
        create: Vec<Spot>,
        remove_ids: Vec<i64>,
        renumber: Vec<(i64, i32)>,
    ) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        // guard: every removal target must still be an Available spot of
        // this lot; a concurrent occupy rolls the whole plan back
        for id in &remove_ids {
            let stored = load_spot_for_update(&txn, *id).await?;
            if stored.lot_id != lot.id {
                return Err(DomainError::not_found("Spot", "id", *id));
            }
            if stored.status == SpotStatus::Occupied.as_str() {
                return Err(DomainError::Conflict(
                    "spot selected for removal is no longer available".into(),
                ));
            }
        }

        lot_to_active(&lot).update(&txn).await.map_err(db_err)?;

        if !remove_ids.is_empty() {
            spot::Entity::delete_many()
                .filter(spot::Column::Id.is_in(remove_ids.clone()))
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }
        for s in &create {
            spot_to_active_new(s).insert(&txn).await.map_err(db_err)?;
        }
        renumber_in_txn(&txn, &renumber).await?;

        txn.commit().await.map_err(db_err)?;
        debug!(
            lot_id = lot.id,
            created = create.len(),
            removed = remove_ids.len(),
            "resize applied"
        );
        Ok(())
    }

    // ── Occupancy engine ────────────────────────────────────────

    async fn apply_occupy(
        &self,
        s: Spot,
        mut reservation: Reservation,
    ) -> DomainResult<Reservation> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let stored = load_spot_for_update(&txn, s.id).await?;
        if stored.status != SpotStatus::Available.as_str() {
            return Err(DomainError::Conflict(format!(
                "slot {} is already occupied",
                stored.number
            )));
        }

        spot_to_active(&s).update(&txn).await.map_err(db_err)?;

        let mut active = reservation_to_active(&reservation);
        active.id = NotSet;
        let inserted = active.insert(&txn).await.map_err(db_err)?;
        reservation.id = inserted.id;

        txn.commit().await.map_err(db_err)?;
        Ok(reservation)
    }

    async fn apply_release(
        &self,
        s: Spot,
        reservation: Reservation,
        mut entry: UsageLogEntry,
    ) -> DomainResult<UsageLogEntry> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let stored_spot = load_spot_for_update(&txn, s.id).await?;
        if stored_spot.status != SpotStatus::Occupied.as_str() {
            return Err(DomainError::Conflict(format!(
                "slot {} is not occupied",
                stored_spot.number
            )));
        }

        let stored_reservation = reservation::Entity::find_by_id(reservation.id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation.id))?;
        if stored_reservation.ended_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "reservation {} is already closed",
                reservation.id
            )));
        }

        // all three writes commit together or not at all
        spot_to_active(&s).update(&txn).await.map_err(db_err)?;
        reservation_to_active(&reservation)
            .update(&txn)
            .await
            .map_err(db_err)?;

        let active = usage_log::ActiveModel {
            id: NotSet,
            user_id: Set(entry.user_id.clone()),
            spot_id: Set(entry.spot_id),
            lot_id: Set(entry.lot_id),
            vehicle_id: Set(entry.vehicle_id.clone()),
            entered_at: Set(entry.entered_at),
            exited_at: Set(entry.exited_at),
            duration_hours: Set(entry.duration_hours),
            cost: Set(entry.cost),
            remarks: Set(entry.remarks.clone()),
        };
        let inserted = active.insert(&txn).await.map_err(db_err)?;
        entry.id = inserted.id;

        txn.commit().await.map_err(db_err)?;
        Ok(entry)
    }

    // ── Reservations ────────────────────────────────────────────

    async fn get_reservation(&self, id: i64) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(reservation_to_domain))
    }

    async fn find_open_reservation(&self, spot_id: i64) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find()
            .filter(reservation::Column::SpotId.eq(spot_id))
            .filter(reservation::Column::EndedAt.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(reservation_to_domain))
    }

    async fn list_open_reservations_for_user(
        &self,
        user_id: &str,
    ) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .filter(reservation::Column::EndedAt.is_null())
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(reservation_to_domain).collect())
    }

    // ── Usage ledger ────────────────────────────────────────────

    async fn list_usage_for_user(&self, user_id: &str) -> DomainResult<Vec<UsageLogEntry>> {
        let models = usage_log::Entity::find()
            .filter(usage_log::Column::UserId.eq(user_id))
            .order_by_desc(usage_log::Column::ExitedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(usage_to_domain).collect())
    }

    async fn list_all_usage(&self) -> DomainResult<Vec<UsageLogEntry>> {
        let models = usage_log::Entity::find()
            .order_by_desc(usage_log::Column::ExitedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(usage_to_domain).collect())
    }

    // ── Export tasks ────────────────────────────────────────────

    async fn insert_export_task(&self, mut task: ExportTask) -> DomainResult<ExportTask> {
        let mut active = export_to_active(&task);
        active.id = NotSet;
        let inserted = active.insert(&self.db).await.map_err(db_err)?;
        task.id = inserted.id;
        Ok(task)
    }

    async fn get_export_task(&self, id: i64) -> DomainResult<Option<ExportTask>> {
        let model = export_task::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(export_to_domain))
    }

    async fn update_export_task(&self, task: ExportTask) -> DomainResult<()> {
        let existing = export_task::Entity::find_by_id(task.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_none() {
            return Err(DomainError::not_found("ExportTask", "id", task.id));
        }
        export_to_active(&task)
            .update(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn claim_pending_export_task(&self) -> DomainResult<Option<ExportTask>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let oldest = export_task::Entity::find()
            .filter(export_task::Column::Status.eq(ExportStatus::Pending.as_str()))
            .order_by_asc(export_task::Column::Id)
            .one(&txn)
            .await
            .map_err(db_err)?;
        let Some(model) = oldest else {
            return Ok(None);
        };

        let mut active: export_task::ActiveModel = model.into();
        active.status = Set(ExportStatus::Processing.as_str().to_string());
        let claimed = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(Some(export_to_domain(claimed)))
    }

    // ── Reminders ───────────────────────────────────────────────

    async fn insert_reminder_log(&self, mut log: ReminderLog) -> DomainResult<ReminderLog> {
        let active = reminder_log::ActiveModel {
            id: NotSet,
            user_id: Set(log.user_id.clone()),
            reminder_type: Set(log.reminder_type.clone()),
            sent_at: Set(log.sent_at),
        };
        let inserted = active.insert(&self.db).await.map_err(db_err)?;
        log.id = inserted.id;
        Ok(log)
    }

    async fn last_reminder_sent(
        &self,
        reminder_type: &str,
    ) -> DomainResult<Option<DateTime<Utc>>> {
        let model = reminder_log::Entity::find()
            .filter(reminder_log::Column::ReminderType.eq(reminder_type))
            .order_by_desc(reminder_log::Column::SentAt)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(|m| m.sent_at))
    }
}
