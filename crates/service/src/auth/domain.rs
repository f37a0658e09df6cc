use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration input
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Login input
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Stored user record. The id is assigned once at creation and the record is
/// never mutated afterwards.
///
/// The password credential is an Argon2 PHC string; it is skipped by
/// `Serialize` and redacted in `Debug`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip)]
    password_hash: String,
}

impl User {
    pub fn new(first_name: String, last_name: String, email: String, password_hash: String) -> Self {
        Self { id: Uuid::new_v4(), first_name, last_name, email, password_hash }
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Outcome of a successful register or login call.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationResult {
    pub user: User,
    pub token: String,
}
