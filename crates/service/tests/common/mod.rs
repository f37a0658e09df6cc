use std::sync::Arc;

use chrono::Utc;
use service::auth::{
    AuthService, FixedClock, InMemoryUserRepository, JwtSettings, JwtTokenGenerator, PasswordHasher, PasswordParams,
    RegisterInput,
};

pub struct Harness {
    pub svc: Arc<AuthService<InMemoryUserRepository>>,
    pub tokens: Arc<JwtTokenGenerator>,
    pub repo: Arc<InMemoryUserRepository>,
    pub clock: Arc<FixedClock>,
}

pub fn settings() -> JwtSettings {
    JwtSettings {
        secret: "integration-test-signing-key".into(),
        issuer: "BuberDinner".into(),
        audience: "BuberDinner".into(),
        expiry_minutes: 60,
    }
}

pub fn harness() -> Harness {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let tokens = Arc::new(JwtTokenGenerator::new(settings(), clock.clone()).unwrap());
    let repo = Arc::new(InMemoryUserRepository::new());
    let hasher = PasswordHasher::new(PasswordParams { memory_kib: 1024, iterations: 1, parallelism: 1 }).unwrap();
    let svc = Arc::new(AuthService::new(repo.clone(), tokens.clone(), hasher).unwrap());
    Harness { svc, tokens, repo, clock }
}

pub fn register(first: &str, last: &str, email: &str, password: &str) -> RegisterInput {
    RegisterInput { first_name: first.into(), last_name: last.into(), email: email.into(), password: password.into() }
}
