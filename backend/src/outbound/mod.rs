//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL document store using Diesel, plus an
//!   in-memory store
//! - **cache**: Redis-backed and in-memory entity caches
//! - **bus**: Redis pub/sub and in-process event buses, and the event
//!   publisher built on them
//! - **directory**: HTTP clients for the user and pet services
//! - **mail**: SMTP and log-only mailers
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod bus;
pub mod cache;
pub mod directory;
pub mod mail;
pub mod persistence;
pub mod redis;
