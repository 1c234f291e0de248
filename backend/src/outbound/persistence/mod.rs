//! Entity persistence adapters.
//!
//! The Postgres adapter uses Diesel with `diesel-async` and a `bb8` pool.
//! All kinds share one JSONB document table. The in-memory adapter backs
//! local runs and tests with the same filtering semantics.

mod diesel_entity_store;
mod error_mapping;
mod memory_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_entity_store::DieselEntityStore;
pub use memory_store::InMemoryEntityStore;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
