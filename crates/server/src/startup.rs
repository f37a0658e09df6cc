use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::auth::{
    AuthService, InMemoryUserRepository, JwtSettings, JwtTokenGenerator, PasswordHasher, PasswordParams, SystemClock,
};

use crate::errors::StartupError;
use crate::metrics;
use crate::routes::{self, auth::AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire the auth core from configuration. Bad key material or hashing
/// parameters fail here rather than on the first request.
pub fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let jwt = &cfg.auth.jwt;
    let settings = JwtSettings {
        secret: jwt.secret.clone(),
        issuer: jwt.issuer.clone(),
        audience: jwt.audience.clone(),
        expiry_minutes: jwt.expiry_minutes,
    };
    let tokens = JwtTokenGenerator::new(settings, Arc::new(SystemClock))?;

    let pw = &cfg.auth.password;
    let hasher = PasswordHasher::new(PasswordParams {
        memory_kib: pw.memory_kib,
        iterations: pw.iterations,
        parallelism: pw.parallelism,
    })?;

    let repo = Arc::new(InMemoryUserRepository::new());
    let auth = AuthService::new(repo, Arc::new(tokens), hasher)?;
    Ok(AppState { auth: Arc::new(auth) })
}

pub fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let state = build_state(cfg)?;
    Ok(routes::build_router(state, build_cors()))
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Build the app and serve it until `shutdown` resolves.
pub async fn run(cfg: AppConfig, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    let app = build_app(&cfg)?;

    if let Some(admin_addr) = cfg.server.admin_addr.as_deref() {
        common::admin_http::spawn_admin_server(admin_addr, metrics::render).await?;
    }

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "auth server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("auth server stopped");
    Ok(())
}
