//! Cache-aside repository shared by every entity kind.
//!
//! The store is authoritative; the cache only mirrors store reads. Reads go
//! cache first and populate on miss. Writes commit to the store first and
//! then invalidate the cached entry, so a reader can never re-populate the
//! cache from an uncommitted write. Cache failures are logged and absorbed.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{CacheLookup, EntityCache, EntityStore, EntityStoreError};
use crate::domain::{Entity, EntityId, Error, ListQuery, Page, next_update_instant};

/// Lifetime of a populated cache entry unless configured otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Read-through, invalidate-on-write facade over one store and one cache.
pub struct CacheAsideRepository<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
    cache: Arc<dyn EntityCache<E>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<E: Entity> Clone for CacheAsideRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            clock: Arc::clone(&self.clock),
            ttl: self.ttl,
        }
    }
}

impl<E: Entity> CacheAsideRepository<E> {
    /// Compose a store and cache using [`DEFAULT_CACHE_TTL`].
    pub fn new(
        store: Arc<dyn EntityStore<E>>,
        cache: Arc<dyn EntityCache<E>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the lifetime of populated entries.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Current instant from the injected clock.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.utc()
    }

    /// Fetch an entity, serving from cache when possible.
    pub async fn get(&self, id: &EntityId) -> Result<E, Error> {
        match self.cache.get(id).await {
            Ok(CacheLookup::Hit(entity)) => {
                debug!(entity = %E::KIND, %id, "cache hit");
                return Ok(entity);
            }
            Ok(CacheLookup::Miss) => debug!(entity = %E::KIND, %id, "cache miss"),
            Err(err) => warn!(
                entity = %E::KIND,
                %id,
                error = %err,
                "cache read failed; falling back to store"
            ),
        }

        let entity = self
            .store
            .get_by_id(id)
            .await
            .map_err(map_store_error::<E>)?
            .ok_or_else(|| not_found::<E>(id))?;

        if let Err(err) = self.cache.set(&entity, self.ttl).await {
            warn!(entity = %E::KIND, %id, error = %err, "cache population failed");
        }
        Ok(entity)
    }

    /// Validate a draft, assign identity and timestamps, and persist it.
    ///
    /// The cache is not pre-populated; the first read misses.
    pub async fn create(&self, draft: E::Draft) -> Result<E, Error> {
        let entity = E::from_draft(EntityId::generate(), draft, self.clock.utc())?;
        self.store
            .create(&entity)
            .await
            .map_err(map_store_error::<E>)?;
        Ok(entity)
    }

    /// Read, patch, stamp and write an entity, then invalidate its cache entry.
    pub async fn update(&self, id: &EntityId, patch: E::Patch) -> Result<E, Error> {
        let mut entity = self.get(id).await?;
        let previous = entity.updated_at();
        entity.apply_patch(patch)?;
        entity.set_updated_at(next_update_instant(previous, self.clock.utc()));

        self.store
            .update(&entity)
            .await
            .map_err(map_store_error::<E>)?;
        self.invalidate(id).await;
        Ok(entity)
    }

    /// Delete an entity and invalidate its cache entry.
    pub async fn delete(&self, id: &EntityId) -> Result<(), Error> {
        let outcome = self.store.delete(id).await;
        self.invalidate(id).await;
        outcome.map_err(map_store_error::<E>)
    }

    /// List straight from the store; list results are never cached.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<E>, Error> {
        self.store.list(query).await.map_err(map_store_error::<E>)
    }

    async fn invalidate(&self, id: &EntityId) {
        if let Err(err) = self.cache.delete(id).await {
            warn!(
                entity = %E::KIND,
                %id,
                error = %err,
                "cache invalidation failed; entry may be served until it expires"
            );
        }
    }
}

fn not_found<E: Entity>(id: &EntityId) -> Error {
    Error::not_found(format!("{} {id} not found", E::KIND))
        .with_details(serde_json::json!({ "entity": E::KIND.as_str(), "id": id.as_str() }))
}

fn map_store_error<E: Entity>(error: EntityStoreError) -> Error {
    match error {
        EntityStoreError::NotFound { id } => match EntityId::new(id.clone()) {
            Ok(parsed) => not_found::<E>(&parsed),
            Err(_) => Error::not_found(format!("{} {id} not found", E::KIND)),
        },
        EntityStoreError::Duplicate { id } => {
            Error::conflict(format!("{} {id} already exists", E::KIND))
        }
        EntityStoreError::Connection { message } => {
            Error::service_unavailable(format!("{} store unavailable: {message}", E::KIND))
        }
        EntityStoreError::Query { message } => {
            Error::internal(format!("{} store error: {message}", E::KIND))
        }
        EntityStoreError::Serialization { message } => {
            Error::internal(format!("{} store serialization failed: {message}", E::KIND))
        }
    }
}

#[cfg(test)]
#[path = "cache_aside_tests.rs"]
mod tests;
