//! Lightweight admin HTTP server spawner
//!
//! Exposes `/healthz` and `/metrics` endpoints, with metrics provided by caller.

use axum::http::StatusCode;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

async fn healthz() -> &'static str { "OK" }

async fn metrics_handler(f: fn() -> (StatusCode, String)) -> (StatusCode, String) {
    f()
}

/// Router for the admin listener; split out so it can be driven without a socket.
pub fn admin_router(metrics_fn: fn() -> (StatusCode, String)) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(move || metrics_handler(metrics_fn)))
}

/// Bind `addr` and serve the admin router on a background task.
/// Bind failures are returned to the caller; serve failures are logged.
pub async fn spawn_admin_server(
    addr: &str,
    metrics_fn: fn() -> (StatusCode, String),
) -> anyhow::Result<JoinHandle<()>> {
    let listener = TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    info!(addr = %bound, "admin server listening");
    let router = admin_router(metrics_fn);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "admin server stopped");
        }
    }))
}
