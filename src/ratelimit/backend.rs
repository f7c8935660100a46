//! Admission backend trait for abstracting the two limiter implementations.

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The request may proceed to its handler.
    Admit,
    /// The caller has exhausted its quota for the current window.
    Deny,
}

/// Trait for admission backend implementations.
///
/// This trait abstracts over the in-process `LocalRateLimiter` and the
/// store-backed `StoreRateLimiter` to allow the HTTP layer to work with
/// either.
#[async_trait]
pub trait AdmissionBackend: Send + Sync {
    /// Decide whether a request from `identity` may proceed, recording the
    /// attempt.
    ///
    /// `is_ip` marks identities resolved from the client IP; they share the
    /// `"ip"` quota class. Credential identities are their own class. An
    /// `Err` means the decision could not be made and the request must fail
    /// closed.
    async fn check(&self, identity: &str, is_ip: bool) -> Result<Verdict>;
}
