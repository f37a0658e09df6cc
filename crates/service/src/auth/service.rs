use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::domain::{AuthenticationResult, LoginInput, RegisterInput, User};
use super::errors::AuthError;
use super::password::PasswordHasher;
use super::repository::UserRepository;
use super::token::{JwtTokenGenerator, TokenGenerator};

const MIN_PASSWORD_LEN: usize = 8;

/// Auth business service independent of web framework.
///
/// Every call is a single request/response; the only shared mutable state is
/// the repository, which serialises conflicting inserts itself.
pub struct AuthService<R: UserRepository, T: TokenGenerator = JwtTokenGenerator> {
    repo: Arc<R>,
    tokens: Arc<T>,
    hasher: PasswordHasher,
    // verified against when the email is unknown so both login failures cost the same
    dummy_hash: String,
}

impl<R: UserRepository, T: TokenGenerator> AuthService<R, T> {
    pub fn new(repo: Arc<R>, tokens: Arc<T>, hasher: PasswordHasher) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash("not-a-real-account-password")?;
        Ok(Self { repo, tokens, hasher, dummy_hash })
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Register a new user and issue a token for it.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{AuthService, InMemoryUserRepository, JwtSettings, JwtTokenGenerator, PasswordHasher, PasswordParams, RegisterInput, SystemClock};
    /// let repo = Arc::new(InMemoryUserRepository::new());
    /// let settings = JwtSettings { secret: "doc-secret".into(), issuer: "BuberDinner".into(), audience: "BuberDinner".into(), expiry_minutes: 60 };
    /// let tokens = Arc::new(JwtTokenGenerator::new(settings, Arc::new(SystemClock)).unwrap());
    /// let hasher = PasswordHasher::new(PasswordParams { memory_kib: 1024, iterations: 1, parallelism: 1 }).unwrap();
    /// let svc = AuthService::new(repo, tokens, hasher).unwrap();
    /// let input = RegisterInput { first_name: "Ada".into(), last_name: "Lovelace".into(), email: "ada@example.com".into(), password: "Secret123".into() };
    /// let result = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(result.user.email, "ada@example.com");
    /// assert!(!result.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthenticationResult, AuthError> {
        if let Err(e) = validate_registration(&input) {
            debug!(reason = e.kind(), code = e.code(), "register_rejected");
            return Err(e);
        }

        if self.repo.find_by_email(&input.email).await?.is_some() {
            let e = AuthError::DuplicateEmail;
            debug!(reason = e.kind(), code = e.code(), "register_rejected");
            return Err(e);
        }

        let password_hash = self.hash_off_executor(input.password).await?;
        let user = User::new(input.first_name, input.last_name, input.email, password_hash);

        // a concurrent register for the same email may have won since the lookup
        if let Err(e) = self.repo.insert(user.clone()).await {
            debug!(reason = e.kind(), code = e.code(), stage = "insert", "register_rejected");
            return Err(e);
        }

        let token = self.tokens.generate(&user)?;
        info!(user_id = %user.id, "user_registered");
        Ok(AuthenticationResult { user, token })
    }

    /// Authenticate a user and issue a token.
    ///
    /// Unknown email and wrong password both fail with
    /// [`AuthError::InvalidCredentials`].
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{AuthService, AuthError, InMemoryUserRepository, JwtSettings, JwtTokenGenerator, LoginInput, PasswordHasher, PasswordParams, RegisterInput, SystemClock};
    /// let repo = Arc::new(InMemoryUserRepository::new());
    /// let settings = JwtSettings { secret: "doc-secret".into(), issuer: "BuberDinner".into(), audience: "BuberDinner".into(), expiry_minutes: 60 };
    /// let tokens = Arc::new(JwtTokenGenerator::new(settings, Arc::new(SystemClock)).unwrap());
    /// let hasher = PasswordHasher::new(PasswordParams { memory_kib: 1024, iterations: 1, parallelism: 1 }).unwrap();
    /// let svc = AuthService::new(repo, tokens, hasher).unwrap();
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { first_name: "N".into(), last_name: "M".into(), email: "u@e.com".into(), password: "Passw0rd".into() }));
    /// let ok = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(ok.user.email, "u@e.com");
    /// let err = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "nope".into() })).unwrap_err();
    /// assert!(matches!(err, AuthError::InvalidCredentials));
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthenticationResult, AuthError> {
        let Some(user) = self.repo.find_by_email(&input.email).await? else {
            let _ = self.verify_off_executor(input.password, self.dummy_hash.clone()).await;
            debug!(reason = "unknown_email", "login_rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_off_executor(input.password, user.password_hash().to_owned()).await? {
            debug!(user_id = %user.id, reason = "password_mismatch", "login_rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.generate(&user)?;
        info!(user_id = %user.id, "user_login");
        Ok(AuthenticationResult { user, token })
    }

    // Argon2 is CPU- and memory-bound; keep it on the blocking pool so slow
    // hashes do not stall other requests on the same worker.
    async fn hash_off_executor(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_off_executor(&self, password: String, stored: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }
}

fn validate_registration(input: &RegisterInput) -> Result<(), AuthError> {
    if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
        return Err(AuthError::Validation("first and last name are required".into()));
    }
    if !input.email.contains('@') {
        return Err(AuthError::Validation("invalid email".into()));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::InMemoryUserRepository;
    use crate::test_support::{build_service, register_input};
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    struct FailingTokens;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl TokenGenerator for FailingTokens {
        fn generate(&self, _user: &User) -> Result<String, AuthError> {
            Err(AuthError::Signing("no key".into()))
        }
    }

    #[tokio::test]
    async fn register_stores_hashed_credential() {
        let (svc, _) = build_service();
        let res = svc.register(register_input("a@x.com")).await.unwrap();

        let stored = svc.repository().find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.id, res.user.id);
        assert_ne!(stored.password_hash(), "Password123");
        assert!(stored.password_hash().starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (svc, _) = build_service();

        let mut bad_email = register_input("no-at-sign");
        bad_email.email = "no-at-sign".into();
        assert!(matches!(svc.register(bad_email).await, Err(AuthError::Validation(_))));

        let mut short = register_input("s@x.com");
        short.password = "short".into();
        assert!(matches!(svc.register(short).await, Err(AuthError::Validation(_))));

        let mut blank = register_input("b@x.com");
        blank.first_name = "  ".into();
        assert!(matches!(svc.register(blank).await, Err(AuthError::Validation(_))));

        assert_eq!(svc.repository().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (svc, _) = build_service();
        svc.register(register_input("a@x.com")).await.unwrap();

        let wrong = svc.login(LoginInput { email: "a@x.com".into(), password: "Wrong12345".into() }).await.unwrap_err();
        let unknown = svc.login(LoginInput { email: "b@x.com".into(), password: "Password123".into() }).await.unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(wrong.code(), unknown.code());
    }

    #[tokio::test]
    async fn signing_failure_surfaces_as_signing_error() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let hasher = PasswordHasher::new(crate::test_support::fast_params()).unwrap();
        let svc = AuthService::new(repo, Arc::new(FailingTokens), hasher).unwrap();

        let err = svc.register(register_input("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Signing(_)));
    }

    #[tokio::test]
    async fn rejected_registrations_are_logged() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (svc, _) = build_service();
        svc.register(register_input("a@x.com")).await.unwrap();
        assert!(svc.register(register_input("a@x.com")).await.is_err());

        let mut short = register_input("s@x.com");
        short.password = "short".into();
        assert!(svc.register(short).await.is_err());

        let out = logs.contents();
        assert!(out.contains("user_registered"));
        assert_eq!(out.matches("register_rejected").count(), 2);
        assert!(out.contains("reason=\"duplicate_email\"") || out.contains("reason=duplicate_email"));
        assert!(out.contains("code=409"));
        assert!(out.contains("code=400"));
        assert!(!out.contains("Password123"));
    }

    #[tokio::test]
    async fn hashing_runs_off_the_async_executor() {
        let (svc, _) = build_service();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        // single-threaded runtime: this only runs if register yields while hashing
        tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

        svc.register(register_input("a@x.com")).await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}
