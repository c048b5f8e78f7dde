//! Process wiring: builds the store actor, the services and the request
//! authenticator from `Config`, and assembles the router.

pub mod router;

use chrono::Duration;
use std::sync::Arc;
use tracing::info;

use crate::auth::strategy::{self, StrategyError};
use crate::auth::{BcryptHasher, JwtTokens, PasswordHasher, TokenService};
use crate::config::Config;
use crate::db;
use crate::error::TrackerError;
use crate::service::Services;

pub use router::{TrackerState, tracker_router};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

/// Opens the store, seeds the admin account and selects the authenticator.
pub async fn bootstrap(cfg: &Config) -> Result<TrackerState, BootstrapError> {
    let store = db::spawn(&cfg.database.url).await?;
    info!(database_url = %cfg.database.url, "store actor ready");

    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(cfg.auth.bcrypt_cost));
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokens::new(
        cfg.auth.jwt_secret.as_bytes(),
        Duration::hours(cfg.auth.token_ttl_hours),
    ));

    let services = Services::new(store.clone(), hasher, tokens.clone());
    services.users.prepare().await?;
    let admin = services.users.seed_admin(&cfg.admin).await?;
    let authenticator = strategy::select(cfg, tokens, admin)?;

    Ok(TrackerState::new(store, services, authenticator))
}
