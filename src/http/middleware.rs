//! Admission and request logging middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, info};

use crate::ratelimit::{AdmissionBackend, Verdict};

/// Header carrying the caller's API credential.
pub const API_KEY_HEADER: &str = "API_KEY";

/// Stable message returned with every 429 response.
pub const DENY_MESSAGE: &str =
    "you have reached the maximum number of requests or actions allowed within a certain time frame";

/// The identity a request is rate limited under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// IP address or API credential value
    pub identity: String,
    /// Whether the identity came from the client IP
    pub is_ip: bool,
}

/// Extract the identity for a request.
///
/// An API credential in the request takes precedence over the client IP.
pub fn extract_identity(headers: &HeaderMap, peer: SocketAddr) -> CallerIdentity {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        if !key.is_empty() {
            return CallerIdentity {
                identity: key.to_string(),
                is_ip: false,
            };
        }
    }

    CallerIdentity {
        identity: client_ip(headers, peer),
        is_ip: true,
    }
}

/// Resolve the client IP: the first `X-Forwarded-For` entry when present,
/// otherwise the peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

/// Admission middleware.
///
/// Consults the backend and short-circuits the handler chain on denial.
/// A denied request gets a 429 with a stable message; a failed check gets a
/// generic 500 with the cause logged server-side only.
pub async fn admit(
    State(backend): State<Arc<dyn AdmissionBackend>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let caller = extract_identity(request.headers(), peer);

    match backend.check(&caller.identity, caller.is_ip).await {
        Ok(Verdict::Admit) => next.run(request).await,
        Ok(Verdict::Deny) => {
            info!(identity = %caller.identity, "Request denied by rate limiter");
            (StatusCode::TOO_MANY_REQUESTS, DENY_MESSAGE).into_response()
        }
        Err(error) => {
            error!(
                identity = %caller.identity,
                error = %error,
                "Rate limit check failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "rate limit error").into_response()
        }
    }
}

/// Log method, path and status for every request.
pub async fn trace_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    debug!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "Handled request"
    );
    response
}
