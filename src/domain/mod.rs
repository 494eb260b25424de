//! Core business entities, state machines and ports.

pub mod billing;
pub mod caller;
pub mod capacity;
pub mod error;
pub mod export;
pub mod lot;
pub mod reservation;
pub mod spot;
pub mod storage;
pub mod usage_log;
pub mod user;
pub mod views;

pub use billing::{billable_hours, close_reservation, session_cost, MIN_BILLABLE_HOURS};
pub use caller::Caller;
pub use capacity::{plan_growth, plan_renumber, plan_resize, plan_shrink, ResizePlan};
pub use error::{DomainError, DomainResult};
pub use export::{ExportStatus, ExportTask, ReminderLog};
pub use lot::Lot;
pub use reservation::Reservation;
pub use spot::{Spot, SpotStatus};
pub use storage::Storage;
pub use usage_log::{UsageLogEntry, AUTO_RELEASE_REMARKS};
pub use user::{Role, User};
pub use views::{HistoryRow, LotOccupancy, UserSummary};
