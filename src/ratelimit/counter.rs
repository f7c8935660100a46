//! In-process counter table with delayed slot release.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Per-identity active-request counts for the in-process backend.
///
/// Every admitted request schedules its own decrement one window later, so
/// counts decay per request rather than resetting on a calendar boundary.
/// Entries persist at zero once their slots drain; the map sheds no keys.
#[derive(Debug, Clone, Default)]
pub struct CounterTable {
    counts: Arc<DashMap<String, u64>>,
}

impl CounterTable {
    /// Create an empty counter table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically take a slot for `key` if its count is below `limit`.
    ///
    /// The entry guard holds the key's shard lock for the whole
    /// check-and-increment, so when a single slot remains exactly one
    /// concurrent caller wins it. Returns `false` without mutating when the
    /// count is already at the limit.
    pub fn try_increment(&self, key: &str, limit: u64) -> bool {
        let mut count = self.counts.entry(key.to_string()).or_insert(0);
        if *count >= limit {
            return false;
        }
        *count += 1;
        true
    }

    /// Release one slot for `key` after `delay` elapses.
    ///
    /// Each admitted request gets its own uncancellable task; these
    /// decrements are the only path by which a count shrinks. The floor is
    /// zero even if decrements and increments interleave adversarially.
    /// Outstanding tasks abandoned at shutdown only touch in-memory state.
    pub fn schedule_decrement(&self, key: &str, delay: Duration) {
        let counts = Arc::clone(&self.counts);
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(mut count) = counts.get_mut(&key) {
                *count = count.saturating_sub(1);
            }
            trace!(key = %key, "released rate limit slot");
        });
    }

    /// Current count for `key`, zero when absent.
    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).map(|c| *c).unwrap_or(0)
    }
}
