//! Error types for the Turnstile service.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Turnstile operations.
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The counter store could not be reached or rejected an operation
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),

    /// A counter store call exceeded its deadline
    #[error("Counter store timed out after {0:?}")]
    StoreTimeout(Duration),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Turnstile operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;
