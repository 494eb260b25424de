//! # ParkHub
//!
//! Parking-lot reservation backend: administrators manage lots and
//! slots, users occupy and release spots, the system keeps the billing
//! ledger and drives reminder and report jobs in the background.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, the occupancy state machine,
//!   billing math, capacity planning and the storage port
//! - **application**: Use-case services and background workers
//! - **infrastructure**: External concerns (database, cache, crypto)
//! - **notifications**: Structured events, event bus and dispatch worker
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: Graceful-shutdown coordination

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, DatabaseStorage, InMemoryStorage};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiState};

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
