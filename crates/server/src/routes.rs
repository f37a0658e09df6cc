use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

pub mod auth;

pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Build the application router: health check plus the register/login endpoints.
pub fn build_router(state: auth::AppState, cors: CorsLayer) -> Router {
    let public = Router::new().route("/health", get(health));

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state);

    public
        .merge(auth_routes)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request; headers are left out since they may carry tokens
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
