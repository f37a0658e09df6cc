use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ProblemDetails;
use service::auth::AuthError;
use thiserror::Error;
use tracing::{error, warn};

const GENERIC_TITLE: &str = "An error occurred while processing your request";
const INVALID_BODY_TITLE: &str = "Invalid request body";

/// Maps request failures onto HTTP problem responses.
///
/// Only client errors carry their message; anything else is logged here and
/// answered with a fixed 500 body.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    /// Body could not be read as the expected JSON payload.
    Body(JsonRejection),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::Body(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::DuplicateEmail) => StatusCode::CONFLICT,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::Signing(_) | AuthError::Hashing(_) | AuthError::Repository(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Body(rejection) => rejection.status(),
        }
    }
}

// serde's own message can quote the offending value, so only a fixed hint is returned
fn body_hint(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "request body is missing fields or has fields of the wrong type",
        JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON",
        JsonRejection::MissingJsonContentType(_) => "expected `Content-Type: application/json`",
        _ => "request body could not be read",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Auth(e) if e.is_client_error() => {
                warn!(code = e.code(), kind = e.kind(), status = status.as_u16(), "request rejected");
                ProblemDetails::new(status.as_u16(), e.to_string())
            }
            ApiError::Auth(e) => {
                error!(code = e.code(), kind = e.kind(), error = %e, "request failed");
                ProblemDetails::new(status.as_u16(), GENERIC_TITLE)
            }
            ApiError::Body(rejection) => {
                warn!(status = status.as_u16(), "request body rejected");
                ProblemDetails::new(status.as_u16(), INVALID_BODY_TITLE).with_detail(body_hint(rejection))
            }
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl From<AuthError> for StartupError {
    fn from(e: AuthError) -> Self {
        Self::InvalidConfig(e.to_string())
    }
}
