//! Per-class request quotas.

use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use crate::config::QuotaConfig;

/// Quota class shared by all IP-identified callers.
pub const IP_CLASS: &str = "ip";

/// A configured request quota: at most `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Maximum requests allowed within the window
    pub limit: u64,
    /// Time window the limit applies over
    pub window: Duration,
}

impl Quota {
    /// Create a new quota.
    pub fn new(limit: u64, window: Duration) -> Self {
        Self { limit, window }
    }

    /// The quota returned for unregistered classes.
    ///
    /// A zero limit denies every request; the window only feeds the
    /// deny-path expiry refresh, which is a no-op for keys that were never
    /// incremented.
    pub fn deny_all() -> Self {
        Self {
            limit: 0,
            window: Duration::from_secs(1),
        }
    }
}

/// Registry of quotas keyed by class.
///
/// Populated once during startup, before any traffic is accepted, then
/// shared read-only behind an `Arc`.
#[derive(Debug, Default)]
pub struct QuotaRegistry {
    quotas: HashMap<String, Quota>,
}

impl QuotaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the quota configuration.
    pub fn from_config(config: &QuotaConfig) -> Self {
        let mut registry = Self::new();
        registry.register(IP_CLASS, config.ip.limit, config.ip.window());
        for key in &config.keys {
            registry.register(&key.key, key.limit, Duration::from_secs(key.window_secs));
        }
        info!(classes = registry.len(), "Quota registry loaded");
        registry
    }

    /// Store or overwrite the quota for a class.
    pub fn register(&mut self, class: impl Into<String>, limit: u64, window: Duration) {
        self.quotas.insert(class.into(), Quota::new(limit, window));
    }

    /// Look up the quota for a class.
    ///
    /// Unregistered classes resolve to the deny-all quota rather than an
    /// error, so unknown credentials fail closed.
    pub fn lookup(&self, class: &str) -> Quota {
        self.quotas
            .get(class)
            .copied()
            .unwrap_or_else(Quota::deny_all)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.quotas.len()
    }

    /// Whether no classes are registered.
    pub fn is_empty(&self) -> bool {
        self.quotas.is_empty()
    }
}
