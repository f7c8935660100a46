//! Rate limiter backed by a shared counter store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::backend::{AdmissionBackend, Verdict};
use super::quota::{QuotaRegistry, IP_CLASS};
use crate::error::{Result, TurnstileError};
use crate::store::CounterStore;

/// Default deadline for a single counter store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

/// Rate limiter whose counters live in a shared store.
///
/// Counts are visible to every server process using the same store and
/// expire through the store's own TTL mechanism. A denial refreshes the
/// key's expiry so a persistent abuser cannot wait out a window that nobody
/// else refreshes.
pub struct StoreRateLimiter<S> {
    registry: Arc<QuotaRegistry>,
    store: S,
    op_timeout: Duration,
}

impl<S: CounterStore> StoreRateLimiter<S> {
    /// Create a limiter with the default store timeout.
    pub fn new(registry: Arc<QuotaRegistry>, store: S) -> Self {
        Self::with_timeout(registry, store, DEFAULT_STORE_TIMEOUT)
    }

    /// Create a limiter with an explicit store timeout.
    pub fn with_timeout(registry: Arc<QuotaRegistry>, store: S, op_timeout: Duration) -> Self {
        Self {
            registry,
            store,
            op_timeout,
        }
    }

    /// Run a store call under the configured deadline.
    ///
    /// A slow or unreachable store surfaces as `StoreTimeout` instead of
    /// hanging the request.
    async fn bounded<T>(&self, op: impl Future<Output = Result<T>> + Send) -> Result<T> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| TurnstileError::StoreTimeout(self.op_timeout))?
    }
}

#[async_trait]
impl<S: CounterStore> AdmissionBackend for StoreRateLimiter<S> {
    async fn check(&self, identity: &str, is_ip: bool) -> Result<Verdict> {
        let class = if is_ip { IP_CLASS } else { identity };
        let quota = self.registry.lookup(class);

        let current = self.bounded(self.store.get_count(identity)).await?;

        if current >= quota.limit {
            debug!(
                identity = %identity,
                count = current,
                limit = quota.limit,
                "Rate limit exceeded"
            );
            // Best effort: a failed refresh must not turn the deny into an
            // error.
            if let Err(error) = self
                .bounded(self.store.extend_expiry(identity, quota.window))
                .await
            {
                warn!(
                    identity = %identity,
                    error = %error,
                    "Failed to extend window on denial"
                );
            }
            return Ok(Verdict::Deny);
        }

        self.bounded(self.store.increment_and_extend(identity, quota.window))
            .await?;
        Ok(Verdict::Admit)
    }
}
