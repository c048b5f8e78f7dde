//! Authentication: password hashing, token issuance/validation and the
//! per-request authentication strategy.
//!
//! Layout:
//! - `password.rs`: `PasswordHasher` and the bcrypt implementation
//! - `token.rs`: `TokenService` and HS256 JWTs
//! - `strategy.rs`: `Authenticator` (bearer token or dev bypass), chosen at startup

pub mod password;
pub mod strategy;
pub mod token;

use serde::{Deserialize, Serialize};

pub use password::{BcryptHasher, PasswordHasher};
pub use strategy::{Authenticator, BearerAuthenticator, DevBypassAuthenticator};
pub use token::{Claims, JwtTokens, TokenError, TokenService};

/// Who is making the request, as carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
}
