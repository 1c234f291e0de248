//! Port abstraction for the per-kind cache-aside accelerator.
//!
//! A lookup distinguishes an absent entry ([`CacheLookup::Miss`]) from a
//! failing backend (`Err`). Callers treat both as "read the store", but only
//! the latter is logged.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Entity, EntityId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by entity cache adapters.
    pub enum EntityCacheError {
        /// The cache backend failed or was unreachable.
        Backend { message: String } => "entity cache backend error: {message}",
        /// A cached value could not be encoded or decoded.
        Serialization { message: String } => "entity cache serialization failed: {message}",
    }
}

/// Result of a cache lookup that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<E> {
    /// A mirrored copy of the entity.
    Hit(E),
    /// No entry for the key.
    Miss,
}

impl<E> CacheLookup<E> {
    /// Convert into an option, discarding the hit/miss distinction.
    pub fn into_option(self) -> Option<E> {
        match self {
            Self::Hit(entity) => Some(entity),
            Self::Miss => None,
        }
    }
}

/// Keyed mirror of one entity kind with bounded entry lifetime.
#[async_trait]
pub trait EntityCache<E: Entity>: Send + Sync {
    /// Look up the entry for `id`.
    async fn get(&self, id: &EntityId) -> Result<CacheLookup<E>, EntityCacheError>;

    /// Store the serialized entity under its id for at most `ttl`.
    async fn set(&self, entity: &E, ttl: Duration) -> Result<(), EntityCacheError>;

    /// Drop the entry for `id`; deleting an absent entry succeeds.
    async fn delete(&self, id: &EntityId) -> Result<(), EntityCacheError>;
}
