//! HTTP server and admission middleware.

mod middleware;
mod server;

pub use middleware::{
    admit, client_ip, extract_identity, trace_requests, CallerIdentity, API_KEY_HEADER,
    DENY_MESSAGE,
};
pub use server::HttpServer;
