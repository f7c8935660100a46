//! Turnstile - HTTP Request Admission Control
//!
//! This crate implements an admission-control layer that decides, per
//! incoming HTTP request, whether the caller (identified by client IP or
//! API credential) may proceed or has exhausted its configured quota for
//! the current time window. Counters live either in process memory or in
//! a Redis store shared across server processes.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
pub mod store;
