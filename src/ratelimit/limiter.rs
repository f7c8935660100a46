//! In-process rate limiter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::backend::{AdmissionBackend, Verdict};
use super::counter::CounterTable;
use super::quota::{QuotaRegistry, IP_CLASS};
use crate::error::Result;

/// Rate limiter keeping all counter state in process memory.
///
/// Admission takes a slot in the counter table and schedules its release
/// one window later, so the effective window slides per admitted request.
/// Unlike [`StoreRateLimiter`](super::StoreRateLimiter) there is no stored
/// expiry to refresh on denial; the two backends deliberately diverge here.
pub struct LocalRateLimiter {
    registry: Arc<QuotaRegistry>,
    table: CounterTable,
}

impl LocalRateLimiter {
    /// Create a limiter over the given quota registry.
    pub fn new(registry: Arc<QuotaRegistry>) -> Self {
        Self {
            registry,
            table: CounterTable::new(),
        }
    }

    /// Current active count for an identity.
    ///
    /// This is primarily useful for testing and introspection.
    pub fn current_count(&self, identity: &str) -> u64 {
        self.table.count(identity)
    }
}

#[async_trait]
impl AdmissionBackend for LocalRateLimiter {
    async fn check(&self, identity: &str, is_ip: bool) -> Result<Verdict> {
        let class = if is_ip { IP_CLASS } else { identity };
        let quota = self.registry.lookup(class);

        if !self.table.try_increment(identity, quota.limit) {
            debug!(
                identity = %identity,
                limit = quota.limit,
                "Rate limit exceeded"
            );
            return Ok(Verdict::Deny);
        }

        self.table.schedule_decrement(identity, quota.window);
        Ok(Verdict::Admit)
    }
}
