//! Redis-backed `EntityCache` implementation.
//!
//! Values are stored with `SET EX`. The TTL is shortened by a random amount
//! of up to a tenth so entries written together do not expire together.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;
use rand::Rng;

use super::cache_key;
use crate::domain::ports::{CacheLookup, EntityCache, EntityCacheError};
use crate::domain::{Entity, EntityId};
use crate::outbound::redis::RedisPool;

/// Redis cache for one entity kind.
pub struct RedisEntityCache<E> {
    pool: RedisPool,
    kind: PhantomData<fn() -> E>,
}

impl<E> Clone for RedisEntityCache<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            kind: PhantomData,
        }
    }
}

impl<E: Entity> RedisEntityCache<E> {
    /// Create a cache over the shared pool.
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            kind: PhantomData,
        }
    }
}

/// Seconds to pass to `SET EX`, jittered downwards and never zero.
fn jittered_seconds(ttl: Duration) -> u64 {
    let seconds = ttl.as_secs().max(1);
    let max_jitter = seconds / 10;
    if max_jitter == 0 {
        return seconds;
    }
    seconds - rand::thread_rng().gen_range(0..=max_jitter)
}

fn backend_error(err: impl std::fmt::Display) -> EntityCacheError {
    EntityCacheError::backend(err.to_string())
}

#[async_trait]
impl<E: Entity> EntityCache<E> for RedisEntityCache<E> {
    async fn get(&self, id: &EntityId) -> Result<CacheLookup<E>, EntityCacheError> {
        let key = cache_key::<E>(id);
        let mut conn = self.pool.get().await.map_err(backend_error)?;
        let cached: Option<String> = conn.get(&key).await.map_err(backend_error)?;
        match cached {
            None => Ok(CacheLookup::Miss),
            Some(json) => serde_json::from_str(&json)
                .map(CacheLookup::Hit)
                .map_err(|err| EntityCacheError::serialization(format!("{key}: {err}"))),
        }
    }

    async fn set(&self, entity: &E, ttl: Duration) -> Result<(), EntityCacheError> {
        let key = cache_key::<E>(entity.id());
        let json = serde_json::to_string(entity)
            .map_err(|err| EntityCacheError::serialization(err.to_string()))?;
        let seconds = jittered_seconds(ttl);
        let mut conn = self.pool.get().await.map_err(backend_error)?;
        let () = conn
            .set_ex(&key, json, seconds)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn delete(&self, id: &EntityId) -> Result<(), EntityCacheError> {
        let key = cache_key::<E>(id);
        let mut conn = self.pool.get().await.map_err(backend_error)?;
        let _removed: i64 = conn.del(&key).await.map_err(backend_error)?;
        Ok(())
    }
}
