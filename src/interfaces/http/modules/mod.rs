pub mod analytics;
pub mod auth;
pub mod health;
pub mod history;
pub mod lots;
pub mod parking;
pub mod reports;
pub mod users;
