//! Use-case services.

pub mod history;
pub mod lots;
pub mod occupancy;
pub mod reminders;
pub mod reports;
pub mod users;

pub use history::HistoryService;
pub use lots::{LotService, LotUpdate, LotWithSpots, NewLot};
pub use occupancy::{OccupancyService, OccupancyTicket, ReleaseReceipt};
pub use reminders::ReminderScheduler;
pub use reports::ReportService;
pub use users::{ProfileUpdate, UserService};
