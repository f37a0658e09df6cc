use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use service::auth::{AuthService, AuthenticationResult, InMemoryUserRepository, LoginInput, RegisterInput};

use crate::errors::ApiError;
use crate::metrics;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<InMemoryUserRepository>>,
}

/// Body returned by both register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub token: String,
}

impl From<AuthenticationResult> for AuthenticationResponse {
    fn from(r: AuthenticationResult) -> Self {
        Self {
            id: r.user.id,
            first_name: r.user.first_name,
            last_name: r.user.last_name,
            email: r.user.email,
            token: r.token,
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<Json<AuthenticationResponse>, ApiError> {
    let Json(input) = payload?;
    let res = state.auth.register(input).await;
    metrics::record_register(&res);
    Ok(Json(res?.into()))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<AuthenticationResponse>, ApiError> {
    let Json(input) = payload?;
    let res = state.auth.login(input).await;
    metrics::record_login(&res);
    Ok(Json(res?.into()))
}
