//! Entity cache adapters.
//!
//! Entries hold the JSON-serialized entity under `<kind prefix><id>`, so the
//! three keyspaces never collide.

mod memory;
mod redis;

pub use self::memory::InMemoryEntityCache;
pub use self::redis::RedisEntityCache;

use crate::domain::{Entity, EntityId};

/// Namespaced cache key for an entity id.
pub(crate) fn cache_key<E: Entity>(id: &EntityId) -> String {
    format!("{}{}", E::KIND.cache_prefix(), id)
}
