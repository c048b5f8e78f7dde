use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::Identity;
use crate::error::TrackerError;

/// Why a presented token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Identity {
            id: c.id,
            username: c.username,
            email: c.email,
        }
    }
}

/// Signed, time-limited credentials.
pub trait TokenService: Send + Sync {
    fn issue(&self, identity: &Identity) -> Result<String, TrackerError>;
    fn validate(&self, token: &str) -> Result<Claims, TokenError>;
}

/// HS256 JWTs signed with a server-held secret.
pub struct JwtTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokens {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation
    }
}

impl TokenService for JwtTokens {
    fn issue(&self, identity: &Identity) -> Result<String, TrackerError> {
        let now = Utc::now();
        let claims = Claims {
            id: identity.id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            sub: identity.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Self::validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity {
            id: 7,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
        }
    }

    #[test]
    fn issued_token_carries_identity() {
        let tokens = JwtTokens::new(b"secret", Duration::hours(24));
        let token = tokens.issue(&alice()).expect("issue");
        let claims = tokens.validate(&token).expect("validate");
        assert_eq!(claims.id, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, Duration::hours(24).num_seconds());
        assert_eq!(Identity::from(claims), alice());
    }

    #[test]
    fn foreign_secret_is_an_invalid_signature() {
        let ours = JwtTokens::new(b"secret", Duration::hours(1));
        let theirs = JwtTokens::new(b"other-secret", Duration::hours(1));
        let token = theirs.issue(&alice()).expect("issue");
        assert_eq!(ours.validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_payload_is_an_invalid_signature() {
        let tokens = JwtTokens::new(b"secret", Duration::hours(1));
        let token = tokens.issue(&alice()).expect("issue");
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = JwtTokens::new(b"secret", Duration::hours(48))
            .issue(&Identity {
                id: 1,
                ..alice()
            })
            .expect("issue");
        let forged_payload = forged.split('.').nth(1).expect("payload");
        parts[1] = forged_payload;
        assert_eq!(
            tokens.validate(&parts.join(".")),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn past_expiry_is_expired() {
        let tokens = JwtTokens::new(b"secret", Duration::seconds(-120));
        let token = tokens.issue(&alice()).expect("issue");
        assert_eq!(tokens.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = JwtTokens::new(b"secret", Duration::hours(1));
        assert_eq!(tokens.validate("not.a.jwt"), Err(TokenError::Malformed));
        assert_eq!(tokens.validate(""), Err(TokenError::Malformed));
    }
}
