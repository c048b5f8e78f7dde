use axum::http::HeaderMap;
use headers::{Authorization, HeaderMapExt, authorization::Bearer};
use std::sync::Arc;
use tracing::{debug, warn};

use super::Identity;
use super::token::TokenService;
use crate::config::Config;
use crate::error::TrackerError;

/// Resolves the caller of a protected route.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, TrackerError>;
}

/// Requires `Authorization: Bearer <jwt>` on every protected request.
pub struct BearerAuthenticator {
    tokens: Arc<dyn TokenService>,
}

impl BearerAuthenticator {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self { tokens }
    }
}

impl Authenticator for BearerAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, TrackerError> {
        let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() else {
            return Err(TrackerError::Unauthorized);
        };
        let claims = self.tokens.validate(bearer.token()).inspect_err(|e| {
            debug!(reason = %e, "bearer token rejected");
        })?;
        Ok(claims.into())
    }
}

/// Development-only: every request acts as one fixed identity.
pub struct DevBypassAuthenticator {
    identity: Identity,
}

impl DevBypassAuthenticator {
    /// Refuses to build for a production environment.
    pub fn new(cfg: &Config, identity: Identity) -> Result<Self, StrategyError> {
        if cfg.is_production() {
            return Err(StrategyError::BypassInProduction);
        }
        Ok(Self { identity })
    }
}

impl Authenticator for DevBypassAuthenticator {
    fn authenticate(&self, _headers: &HeaderMap) -> Result<Identity, TrackerError> {
        Ok(self.identity.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("auth.dev_bypass must not be enabled in production")]
    BypassInProduction,

    #[error("auth.dev_bypass needs an account to act as, but none exists")]
    NoBypassIdentity,
}

/// Picks the request authenticator once, at startup. `bypass_as` is only
/// consulted when `auth.dev_bypass` is set.
pub fn select(
    cfg: &Config,
    tokens: Arc<dyn TokenService>,
    bypass_as: Option<Identity>,
) -> Result<Arc<dyn Authenticator>, StrategyError> {
    if cfg.auth.dev_bypass {
        if cfg.is_production() {
            return Err(StrategyError::BypassInProduction);
        }
        let identity = bypass_as.ok_or(StrategyError::NoBypassIdentity)?;
        warn!(
            username = %identity.username,
            "authentication bypass enabled; all requests act as a fixed identity"
        );
        return Ok(Arc::new(DevBypassAuthenticator::new(cfg, identity)?));
    }
    Ok(Arc::new(BearerAuthenticator::new(tokens)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::JwtTokens;
    use crate::config::Environment;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn tokens() -> Arc<dyn TokenService> {
        Arc::new(JwtTokens::new(b"secret", Duration::hours(1)))
    }

    fn bob() -> Identity {
        Identity {
            id: 3,
            username: "bob".to_string(),
            email: "bob@x.com".to_string(),
        }
    }

    #[test]
    fn bearer_accepts_a_valid_token() {
        let tokens = tokens();
        let token = tokens.issue(&bob()).expect("issue");
        let auth = BearerAuthenticator::new(tokens);
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
        );
        assert_eq!(auth.authenticate(&headers).expect("identity"), bob());
    }

    #[test]
    fn bearer_rejects_missing_and_bad_tokens() {
        let auth = BearerAuthenticator::new(tokens());
        assert!(matches!(
            auth.authenticate(&HeaderMap::new()),
            Err(TrackerError::Unauthorized)
        ));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer junk"));
        assert!(matches!(
            auth.authenticate(&headers),
            Err(TrackerError::Token(_))
        ));
    }

    #[test]
    fn bypass_is_refused_in_production() {
        let mut cfg = Config::default();
        cfg.basic.environment = Environment::Production;
        assert!(DevBypassAuthenticator::new(&cfg, bob()).is_err());

        cfg.auth.dev_bypass = true;
        assert!(matches!(
            select(&cfg, tokens(), Some(bob())),
            Err(StrategyError::BypassInProduction)
        ));
    }

    #[test]
    fn bypass_without_an_account_is_refused() {
        let mut cfg = Config::default();
        cfg.auth.dev_bypass = true;
        assert!(matches!(
            select(&cfg, tokens(), None),
            Err(StrategyError::NoBypassIdentity)
        ));
        cfg.auth.dev_bypass = false;
        assert!(select(&cfg, tokens(), None).is_ok());
    }

    #[test]
    fn bypass_ignores_headers_in_development() {
        let mut cfg = Config::default();
        cfg.auth.dev_bypass = true;
        let auth = select(&cfg, tokens(), Some(bob())).expect("strategy");
        let identity = auth.authenticate(&HeaderMap::new()).expect("identity");
        assert_eq!(identity, bob());
    }
}
