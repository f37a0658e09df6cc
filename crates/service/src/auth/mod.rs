//! Auth module: domain types, storage and token seams, and the service that
//! orchestrates them.
//!
//! Registration and login business logic lives in [`service::AuthService`].

pub mod clock;
pub mod domain;
pub mod errors;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{AuthenticationResult, LoginInput, RegisterInput, User};
pub use errors::AuthError;
pub use password::{PasswordHasher, PasswordParams};
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::AuthService;
pub use token::{Claims, JwtSettings, JwtTokenGenerator, TokenGenerator};
