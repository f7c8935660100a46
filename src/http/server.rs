//! HTTP server wiring.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use super::middleware::{admit, client_ip, trace_requests};
use crate::error::{Result, TurnstileError};
use crate::ratelimit::AdmissionBackend;

/// HTTP server exposing the rate-limited surface.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// The admission backend guarding the routes
    backend: Arc<dyn AdmissionBackend>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: SocketAddr, backend: Arc<dyn AdmissionBackend>) -> Self {
        Self { addr, backend }
    }

    /// Build the router.
    ///
    /// Admission guards the application routes; `/healthz` stays outside it
    /// so probes are never throttled. Request logging wraps everything.
    pub fn router(backend: Arc<dyn AdmissionBackend>) -> Router {
        Router::new()
            .route("/", get(get_ip))
            .layer(from_fn_with_state(backend, admit))
            .route("/healthz", get(health))
            .layer(from_fn(trace_requests))
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server shuts down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app =
            Self::router(self.backend).into_make_service_with_connect_info::<SocketAddr>();

        info!(addr = %self.addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                TurnstileError::Io(e)
            })
    }
}

/// Echo the caller's resolved IP address.
async fn get_ip(ConnectInfo(peer): ConnectInfo<SocketAddr>, headers: HeaderMap) -> String {
    format!("Your IP address is: {}", client_ip(&headers, peer))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::middleware::{API_KEY_HEADER, DENY_MESSAGE};
    use crate::ratelimit::{LocalRateLimiter, QuotaRegistry, Verdict, IP_CLASS};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_backend() -> Arc<dyn AdmissionBackend> {
        let mut registry = QuotaRegistry::new();
        registry.register(IP_CLASS, 2, Duration::from_secs(10));
        registry.register("api-key-1", 1, Duration::from_secs(10));
        Arc::new(LocalRateLimiter::new(Arc::new(registry)))
    }

    fn request(path: &str, api_key: Option<&str>) -> Request<Body> {
        let peer: SocketAddr = "1.2.3.4:50000".parse().unwrap();
        let mut builder = Request::builder().uri(path).extension(ConnectInfo(peer));
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_get_ip_admitted() {
        let router = HttpServer::router(test_backend());

        let response = router.oneshot(request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Your IP address is: 1.2.3.4");
    }

    #[tokio::test]
    async fn test_over_limit_returns_429() {
        let router = HttpServer::router(test_backend());

        for _ in 0..2 {
            let response = router.clone().oneshot(request("/", None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = router.oneshot(request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_string(response).await, DENY_MESSAGE);
    }

    #[tokio::test]
    async fn test_known_credential_uses_its_quota() {
        let router = HttpServer::router(test_backend());

        let response = router
            .clone()
            .oneshot(request("/", Some("api-key-1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(request("/", Some("api-key-1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_unknown_credential_denied_immediately() {
        let router = HttpServer::router(test_backend());

        let response = router
            .oneshot(request("/", Some("api-key-9")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_healthz_not_rate_limited() {
        let router = HttpServer::router(test_backend());

        for _ in 0..10 {
            let response = router
                .clone()
                .oneshot(request("/healthz", None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl AdmissionBackend for FailingBackend {
        async fn check(&self, _identity: &str, _is_ip: bool) -> crate::error::Result<Verdict> {
            Err(crate::error::TurnstileError::StoreUnavailable(
                "connection refused".into(),
            ))
        }
    }

    #[tokio::test]
    async fn test_backend_error_returns_500() {
        let router = HttpServer::router(Arc::new(FailingBackend));

        let response = router.oneshot(request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "rate limit error");
    }
}
