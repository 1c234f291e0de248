//! In-process `EntityCache` used for local runs and tests.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::cache_key;
use crate::domain::ports::{CacheLookup, EntityCache, EntityCacheError};
use crate::domain::{Entity, EntityId};

struct CachedValue {
    json: String,
    /// `None` when the TTL reaches past the clock's range; such entries never expire.
    expires_at: Option<Instant>,
}

impl CachedValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Serialized entries with expiry, keyed like the Redis adapter.
pub struct InMemoryEntityCache<E> {
    entries: Mutex<HashMap<String, CachedValue>>,
    kind: PhantomData<fn() -> E>,
}

impl<E> Default for InMemoryEntityCache<E> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            kind: PhantomData,
        }
    }
}

impl<E: Entity> InMemoryEntityCache<E> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock()
            .map(|entries| {
                let now = Instant::now();
                entries.values().filter(|value| value.is_live(now)).count()
            })
            .unwrap_or_default()
    }

    /// Whether no live entries remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CachedValue>>, EntityCacheError> {
        self.entries
            .lock()
            .map_err(|_| EntityCacheError::backend("in-memory cache lock poisoned"))
    }
}

#[async_trait]
impl<E: Entity> EntityCache<E> for InMemoryEntityCache<E> {
    async fn get(&self, id: &EntityId) -> Result<CacheLookup<E>, EntityCacheError> {
        let key = cache_key::<E>(id);
        let mut entries = self.lock()?;
        let Some(value) = entries.get(&key) else {
            return Ok(CacheLookup::Miss);
        };
        if !value.is_live(Instant::now()) {
            entries.remove(&key);
            return Ok(CacheLookup::Miss);
        }
        serde_json::from_str(&value.json)
            .map(CacheLookup::Hit)
            .map_err(|err| EntityCacheError::serialization(err.to_string()))
    }

    async fn set(&self, entity: &E, ttl: Duration) -> Result<(), EntityCacheError> {
        let json = serde_json::to_string(entity)
            .map_err(|err| EntityCacheError::serialization(err.to_string()))?;
        let value = CachedValue {
            json,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.lock()?.insert(cache_key::<E>(entity.id()), value);
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> Result<(), EntityCacheError> {
        self.lock()?.remove(&cache_key::<E>(id));
        Ok(())
    }
}
