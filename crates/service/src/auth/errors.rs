use thiserror::Error;

/// Business errors for auth workflows.
///
/// Messages are safe to log: none of them carry password material.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token signing error: {0}")]
    Signing(String),
    #[error("hashing error: {0}")]
    Hashing(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::DuplicateEmail => 1002,
            AuthError::InvalidCredentials => 1004,
            AuthError::Hashing(_) => 1101,
            AuthError::Signing(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }

    /// Short label used as a metrics/log dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation",
            AuthError::DuplicateEmail => "duplicate_email",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Hashing(_) => "hashing",
            AuthError::Signing(_) => "signing",
            AuthError::Repository(_) => "repository",
        }
    }

    /// Whether the caller can fix the failure by changing its request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthError::Validation(_) | AuthError::DuplicateEmail | AuthError::InvalidCredentials)
    }
}
