//! Shared counter storage for the store-backed rate limiter.

mod redis;

pub use self::redis::RedisStore;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Durable per-identity counters with TTL-based expiry.
///
/// Implementations must make `increment_and_extend` atomic on the server
/// side, or compose it so that a crash between the increment and the
/// expiry refresh leaves the key counted without a TTL. Callers treat such
/// a key as still valid; a later call refreshes the expiry.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current count for `key`. An absent key is zero, never an error.
    async fn get_count(&self, key: &str) -> Result<u64>;

    /// Increment the counter for `key` by one and reset its expiry to
    /// now + `window`.
    async fn increment_and_extend(&self, key: &str, window: Duration) -> Result<()>;

    /// Reset the expiry for `key` without changing its count.
    ///
    /// Called on denial so a persistent abuser's window keeps sliding
    /// forward instead of quietly lapsing.
    async fn extend_expiry(&self, key: &str, window: Duration) -> Result<()>;
}
