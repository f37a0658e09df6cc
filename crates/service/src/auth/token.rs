//! Signed, time-bounded tokens.
//!
//! Tokens are HS256 JWTs. Timestamps come from the injected [`Clock`], never
//! from the wall clock directly, and expiry is checked against that same
//! clock when decoding.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clock::Clock;
use super::domain::User;
use super::errors::AuthError;

/// Seconds of tolerated clock skew when checking `exp`.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Longest accepted token lifetime (ten years).
pub const MAX_EXPIRY_MINUTES: i64 = 10 * 365 * 24 * 60;

/// Mints a token for an authenticated user.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self, user: &User) -> Result<String, AuthError>;
}

#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiry_minutes: i64,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiry_minutes", &self.expiry_minutes)
            .finish()
    }
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    /// Unique per token
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

pub struct JwtTokenGenerator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenGenerator {
    /// Build a generator from settings. Missing key material or a lifetime
    /// outside `1..=MAX_EXPIRY_MINUTES` is reported as [`AuthError::Signing`].
    pub fn new(settings: JwtSettings, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        if settings.secret.is_empty() {
            return Err(AuthError::Signing("signing key is empty".into()));
        }
        if settings.issuer.trim().is_empty() || settings.audience.trim().is_empty() {
            return Err(AuthError::Signing("issuer and audience are required".into()));
        }
        let lifetime = Some(settings.expiry_minutes)
            .filter(|m| (1..=MAX_EXPIRY_MINUTES).contains(m))
            .and_then(Duration::try_minutes)
            .ok_or_else(|| AuthError::Signing(format!("invalid token lifetime: {} minutes", settings.expiry_minutes)))?;

        tracing::info!(issuer = %settings.issuer, audience = %settings.audience, expiry_minutes = settings.expiry_minutes, "token generator initialized");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            issuer: settings.issuer,
            audience: settings.audience,
            lifetime,
            clock,
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Verify signature, issuer and audience, then check expiry against the clock.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::InvalidCredentials
            })?
            .claims;

        if claims.exp.saturating_add(EXPIRY_LEEWAY_SECS) < self.clock.now().timestamp() {
            tracing::debug!(sub = %claims.sub, "token expired");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(claims)
    }
}

impl TokenGenerator for JwtTokenGenerator {
    fn generate(&self, user: &User) -> Result<String, AuthError> {
        let now = self.clock.now();
        let exp = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AuthError::Signing(format!("token expiry overflows at {now}")))?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::FixedClock;
    use crate::test_support::jwt_settings;
    use chrono::{DateTime, TimeZone, Utc};

    fn user() -> User {
        User::new("Grace".into(), "Hopper".into(), "grace@example.com".into(), "hash".into())
    }

    #[test]
    fn claims_follow_clock_and_lifetime() {
        let issued = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let clock = Arc::new(FixedClock::new(issued));
        let gen = JwtTokenGenerator::new(jwt_settings(), clock).unwrap();
        let u = user();

        let token = gen.generate(&u).unwrap();
        let claims = gen.decode(&token).unwrap();

        assert_eq!(claims.sub, u.id.to_string());
        assert_eq!(claims.email, "grace@example.com");
        assert_eq!(claims.given_name, "Grace");
        assert_eq!(claims.family_name, "Hopper");
        assert_eq!(claims.iat, issued.timestamp());
        assert_eq!(claims.exp, issued.timestamp() + 60 * 60);
        assert_eq!(claims.iss, "BuberDinner");
        assert_eq!(claims.aud, "BuberDinner");
    }

    #[test]
    fn each_token_has_its_own_jti() {
        let gen = JwtTokenGenerator::new(jwt_settings(), Arc::new(FixedClock::new(Utc::now()))).unwrap();
        let u = user();
        let a = gen.decode(&gen.generate(&u).unwrap()).unwrap();
        let b = gen.decode(&gen.generate(&u).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let gen = JwtTokenGenerator::new(jwt_settings(), clock.clone()).unwrap();
        let token = gen.generate(&user()).unwrap();

        clock.advance(Duration::minutes(59));
        assert!(gen.decode(&token).is_ok());
        clock.advance(Duration::minutes(3));
        assert!(matches!(gen.decode(&token), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn foreign_key_or_audience_is_rejected() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Utc::now()));
        let gen = JwtTokenGenerator::new(jwt_settings(), clock.clone()).unwrap();
        let token = gen.generate(&user()).unwrap();

        let other_key = JwtTokenGenerator::new(JwtSettings { secret: "another-secret".into(), ..jwt_settings() }, clock.clone()).unwrap();
        assert!(other_key.decode(&token).is_err());

        let other_aud = JwtTokenGenerator::new(JwtSettings { audience: "SomeoneElse".into(), ..jwt_settings() }, clock).unwrap();
        assert!(other_aud.decode(&token).is_err());
    }

    #[test]
    fn bad_settings_are_signing_errors() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Utc::now()));
        let empty = JwtTokenGenerator::new(JwtSettings { secret: String::new(), ..jwt_settings() }, clock.clone());
        assert!(matches!(empty, Err(AuthError::Signing(_))));
        let zero = JwtTokenGenerator::new(JwtSettings { expiry_minutes: 0, ..jwt_settings() }, clock.clone());
        assert!(matches!(zero, Err(AuthError::Signing(_))));
        let blank = JwtTokenGenerator::new(JwtSettings { issuer: " ".into(), ..jwt_settings() }, clock);
        assert!(matches!(blank, Err(AuthError::Signing(_))));
    }

    #[test]
    fn oversized_lifetime_fails_at_construction() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Utc::now()));
        let huge = JwtTokenGenerator::new(JwtSettings { expiry_minutes: 1_000_000_000_000, ..jwt_settings() }, clock.clone());
        assert!(matches!(huge, Err(AuthError::Signing(_))));
        let over = JwtTokenGenerator::new(JwtSettings { expiry_minutes: MAX_EXPIRY_MINUTES + 1, ..jwt_settings() }, clock.clone());
        assert!(matches!(over, Err(AuthError::Signing(_))));
        let max = JwtTokenGenerator::new(JwtSettings { expiry_minutes: MAX_EXPIRY_MINUTES, ..jwt_settings() }, clock).unwrap();
        assert!(max.generate(&user()).is_ok());
    }

    #[test]
    fn expiry_past_the_end_of_time_is_a_signing_error() {
        let clock = Arc::new(FixedClock::new(DateTime::<Utc>::MAX_UTC - Duration::minutes(1)));
        let gen = JwtTokenGenerator::new(jwt_settings(), clock).unwrap();
        assert!(matches!(gen.generate(&user()), Err(AuthError::Signing(_))));
    }

    #[test]
    fn settings_debug_hides_secret() {
        assert!(!format!("{:?}", jwt_settings()).contains("unit-test-signing-key"));
    }
}
