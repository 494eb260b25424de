//! Database entities module

pub mod export_task;
pub mod lot;
pub mod reminder_log;
pub mod reservation;
pub mod spot;
pub mod usage_log;
pub mod user;

pub use export_task::Entity as ExportTask;
pub use lot::Entity as Lot;
pub use reminder_log::Entity as ReminderLog;
pub use reservation::Entity as Reservation;
pub use spot::Entity as Spot;
pub use usage_log::Entity as UsageLog;
pub use user::Entity as User;
