//! Storage implementations.
//!
//! `InMemoryStorage` backs tests and local development; the SQL-backed
//! implementation lives in `infrastructure::database`.

pub mod memory;

pub use memory::InMemoryStorage;
