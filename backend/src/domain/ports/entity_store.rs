//! Port abstraction for durable per-kind entity storage.
//!
//! A store is the sole writer of authoritative state for one entity kind.
//! Adapters report "zero rows matched" as [`EntityStoreError::NotFound`] so
//! the domain can distinguish a missing record from a broken backend.

use async_trait::async_trait;

use crate::domain::{Entity, EntityId, ListQuery, Page};

use super::define_port_error;

define_port_error! {
    /// Errors raised by entity store adapters.
    pub enum EntityStoreError {
        /// The backing store could not be reached.
        Connection { message: String } => "entity store connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } => "entity store query failed: {message}",
        /// No stored record matched the identifier.
        NotFound { id: String } => "no stored entity matched id {id}",
        /// A record with the same identifier already exists.
        Duplicate { id: String } => "an entity with id {id} already exists",
        /// A stored document could not be encoded or decoded.
        Serialization { message: String } => "entity store serialization failed: {message}",
    }
}

/// Durable CRUD over one entity kind.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Insert a new record.
    async fn create(&self, entity: &E) -> Result<(), EntityStoreError>;

    /// Fetch a record by identifier.
    async fn get_by_id(&self, id: &EntityId) -> Result<Option<E>, EntityStoreError>;

    /// Replace an existing record, failing with `NotFound` when nothing matched.
    async fn update(&self, entity: &E) -> Result<(), EntityStoreError>;

    /// Remove a record, failing with `NotFound` when nothing was deleted.
    async fn delete(&self, id: &EntityId) -> Result<(), EntityStoreError>;

    /// List records newest first, applying the equality filter and page window.
    async fn list(&self, query: &ListQuery) -> Result<Page<E>, EntityStoreError>;
}
