//! Redis-backed counter store.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tracing::debug;

use super::CounterStore;
use crate::error::{Result, TurnstileError};

/// Counter store backed by a shared Redis instance.
///
/// Counters are plain integer keys with a TTL; Redis removes them once the
/// expiry lapses with no further writes, which is the only cleanup this
/// store needs.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Create a store from a Redis connection URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| TurnstileError::Config(format!("invalid redis url: {e}")))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(store_unavailable)
    }
}

fn store_unavailable(error: redis::RedisError) -> TurnstileError {
    TurnstileError::StoreUnavailable(error.to_string())
}

/// EXPIRE takes whole seconds; a positive sub-second window must not
/// collapse to zero and delete the key.
fn window_secs(window: Duration) -> i64 {
    (window.as_secs() as i64).max(1)
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn get_count(&self, key: &str) -> Result<u64> {
        let mut conn = self.connection().await?;
        let count: Option<u64> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(store_unavailable)?;
        Ok(count.unwrap_or(0))
    }

    async fn increment_and_extend(&self, key: &str, window: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        // MULTI/EXEC keeps the increment and the TTL refresh atomic on the
        // server.
        let _: () = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(key)
            .ignore()
            .cmd("EXPIRE")
            .arg(key)
            .arg(window_secs(window))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(store_unavailable)?;
        debug!(key = %key, "Incremented counter");
        Ok(())
    }

    async fn extend_expiry(&self, key: &str, window: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("EXPIRE")
            .arg(key)
            .arg(window_secs(window))
            .query_async(&mut conn)
            .await
            .map_err(store_unavailable)?;
        Ok(())
    }
}
