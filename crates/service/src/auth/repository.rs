use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::domain::User;
use super::errors::AuthError;

/// Repository abstraction for user persistence.
///
/// Implementations own the "one user per email" invariant: `insert` must
/// reject a second record for an email atomically with respect to other
/// callers. Emails are matched exactly (case-sensitive, no normalisation).
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn insert(&self, user: User) -> Result<(), AuthError>;
    async fn count(&self) -> Result<usize, AuthError>;
}

/// Process-local store keyed by email.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users.get(email).cloned())
    }

    async fn insert(&self, user: User) -> Result<(), AuthError> {
        let mut users = self.users.write().await;
        match users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AuthError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn count(&self) -> Result<usize, AuthError> {
        Ok(self.users.read().await.len())
    }
}
