use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, Level};

use turnstile::config::{BackendKind, TurnstileConfig};
use turnstile::http::HttpServer;
use turnstile::ratelimit::{AdmissionBackend, LocalRateLimiter, QuotaRegistry, StoreRateLimiter};
use turnstile::store::RedisStore;

/// HTTP request admission control with per-caller rate limits.
#[derive(Parser, Debug)]
#[command(name = "turnstile", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting Turnstile Admission Control Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match args.config {
        Some(path) => TurnstileConfig::from_file(&path)?,
        None => TurnstileConfig::default(),
    };
    info!(
        listen_addr = %config.server.listen_addr,
        backend = ?config.backend,
        "Configuration loaded"
    );

    // Quotas register once, before any traffic is accepted.
    let registry = Arc::new(QuotaRegistry::from_config(&config.quotas));

    let backend: Arc<dyn AdmissionBackend> = match config.backend {
        BackendKind::Memory => Arc::new(LocalRateLimiter::new(registry)),
        BackendKind::Redis => {
            let store = RedisStore::new(&config.store.redis_url)?;
            Arc::new(StoreRateLimiter::with_timeout(
                registry,
                store,
                config.store.operation_timeout(),
            ))
        }
    };
    info!("Rate limiter initialized");

    let server = HttpServer::new(config.server.listen_addr, backend);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Turnstile Admission Control Service stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
