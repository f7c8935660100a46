//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main configuration for the Turnstile service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Which counter backend to use
    #[serde(default)]
    pub backend: BackendKind,

    /// Shared counter store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Quota configuration
    #[serde(default)]
    pub quotas: QuotaConfig,
}

impl Default for TurnstileConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendKind::default(),
            store: StoreConfig::default(),
            quotas: QuotaConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

/// Counter backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local in-memory counters
    #[default]
    Memory,
    /// Redis-backed counters shared across processes
    Redis,
}

/// Shared counter store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Deadline for a single store operation in milliseconds
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Deadline for a single store operation.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_operation_timeout_ms() -> u64 {
    250
}

/// Quota configuration: one rule for all IP-identified callers plus
/// per-credential rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Quota applied to every caller identified by IP
    #[serde(default = "default_ip_quota")]
    pub ip: QuotaRule,

    /// Quotas for specific API credentials
    #[serde(default)]
    pub keys: Vec<KeyQuota>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            ip: default_ip_quota(),
            keys: Vec::new(),
        }
    }
}

fn default_ip_quota() -> QuotaRule {
    QuotaRule {
        limit: 3,
        window_secs: 10,
    }
}

/// A request limit over a time window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaRule {
    /// Maximum requests allowed within the window
    pub limit: u64,
    /// Window length in seconds
    pub window_secs: u64,
}

impl QuotaRule {
    /// The window as a duration.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// A quota rule bound to a specific API credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyQuota {
    /// The credential value the rule applies to
    pub key: String,
    /// Maximum requests allowed within the window
    pub limit: u64,
    /// Window length in seconds
    pub window_secs: u64,
}

impl TurnstileConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TurnstileConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::TurnstileError::Config(e.to_string()))?;
        Ok(config)
    }
}
