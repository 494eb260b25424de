//! Business logic: use-case services and outbound ports.

pub mod ports;
pub mod services;

pub use ports::{PlainTextReportGenerator, ReportGenerator};
pub use services::{
    HistoryService, LotService, OccupancyService, ReminderScheduler, ReportService, UserService,
};
