//! Shared Redis handles for the cache and bus adapters.
//!
//! One pooled command connection serves cache reads, writes and publishes.
//! Pub/sub subscriptions need dedicated connections, so the raw client is
//! kept alongside the pool for those.

use std::time::Duration;

use bb8_redis::redis::{self, Client};
use bb8_redis::{RedisConnectionManager, bb8};

/// Errors raised while building or using the Redis handles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedisPoolError {
    /// The URL was invalid or the pool could not be built.
    #[error("failed to build redis pool: {message}")]
    Build {
        /// Underlying diagnostic.
        message: String,
    },
    /// No pooled connection became available.
    #[error("failed to get redis connection: {message}")]
    Checkout {
        /// Underlying diagnostic.
        message: String,
    },
}

/// Pooled command connections plus the client for pub/sub.
#[derive(Clone)]
pub struct RedisPool {
    pool: bb8::Pool<RedisConnectionManager>,
    client: Client,
}

impl RedisPool {
    /// Dial Redis at `url`.
    ///
    /// # Errors
    ///
    /// Returns `RedisPoolError::Build` for invalid URLs or when the initial
    /// connections cannot be established within `connection_timeout`.
    pub async fn connect(url: &str, connection_timeout: Duration) -> Result<Self, RedisPoolError> {
        let build = |err: redis::RedisError| RedisPoolError::Build {
            message: err.to_string(),
        };
        let manager = RedisConnectionManager::new(url).map_err(build)?;
        let client = Client::open(url).map_err(build)?;
        let pool = bb8::Pool::builder()
            .max_size(16)
            .connection_timeout(connection_timeout)
            .build(manager)
            .await
            .map_err(build)?;
        Ok(Self { pool, client })
    }

    /// Check out a pooled command connection.
    ///
    /// # Errors
    ///
    /// Returns `RedisPoolError::Checkout` when the pool is exhausted or the
    /// server is unreachable.
    pub async fn get(
        &self,
    ) -> Result<bb8::PooledConnection<'_, RedisConnectionManager>, RedisPoolError> {
        self.pool
            .get()
            .await
            .map_err(|err| RedisPoolError::Checkout {
                message: err.to_string(),
            })
    }

    /// Client used to open dedicated pub/sub connections.
    pub fn client(&self) -> &Client {
        &self.client
    }
}
