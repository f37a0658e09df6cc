#![cfg(test)]
use std::sync::Arc;

use chrono::Utc;

use crate::auth::{
    AuthService, FixedClock, InMemoryUserRepository, JwtSettings, JwtTokenGenerator, PasswordHasher, PasswordParams,
    RegisterInput,
};

/// Cheapest argon2 cost the crate accepts; keeps unit tests fast.
pub fn fast_params() -> PasswordParams {
    PasswordParams { memory_kib: 1024, iterations: 1, parallelism: 1 }
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "unit-test-signing-key".into(),
        issuer: "BuberDinner".into(),
        audience: "BuberDinner".into(),
        expiry_minutes: 60,
    }
}

pub fn register_input(email: &str) -> RegisterInput {
    RegisterInput {
        first_name: "Test".into(),
        last_name: "User".into(),
        email: email.into(),
        password: "Password123".into(),
    }
}

pub fn build_service() -> (AuthService<InMemoryUserRepository>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let tokens = JwtTokenGenerator::new(jwt_settings(), clock.clone()).expect("token generator");
    let hasher = PasswordHasher::new(fast_params()).expect("hasher");
    let svc = AuthService::new(Arc::new(InMemoryUserRepository::new()), Arc::new(tokens), hasher).expect("service");
    (svc, clock)
}
