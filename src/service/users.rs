use chrono::Utc;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

use crate::auth::{Identity, PasswordHasher, TokenService};
use crate::config::AdminConfig;
use crate::db::StoreHandle;
use crate::db::models::{DbUser, PublicUser};
use crate::error::TrackerError;
use crate::types::{LoginRequest, LoginResponse, RegisterRequest};

/// Audit events go to their own target so they can be filtered or routed
/// separately (`RUST_LOG=audit=info`).
const AUDIT: &str = "audit";

#[derive(Clone)]
pub struct UserService {
    store: StoreHandle,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    /// Hash checked against when the username is unknown, so both login
    /// failures cost one bcrypt verify.
    dummy_hash: Arc<OnceLock<String>>,
}

impl UserService {
    pub fn new(
        store: StoreHandle,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Creates an account. The password is stored only as a bcrypt hash.
    pub async fn register(&self, req: RegisterRequest) -> Result<i64, TrackerError> {
        if [&req.username, &req.password, &req.email]
            .iter()
            .any(|f| f.trim().is_empty())
        {
            return Err(TrackerError::validation("All fields are required"));
        }

        let hash = self.hash(req.password).await?;
        let id = self
            .store
            .insert_user(req.username.clone(), hash, req.email, Utc::now())
            .await?;
        info!(target: AUDIT, event = "REGISTER", user_id = id, username = %req.username);
        Ok(id)
    }

    /// Unknown username and wrong password are indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, TrackerError> {
        let user = self.store.find_user_by_username(&req.username).await?;

        let (hash, user) = match user {
            Some(u) => (u.password.clone(), Some(u)),
            None => (self.dummy_hash().await?, None),
        };
        let matches = self.verify(req.password, hash).await?;

        let user = match user {
            Some(u) if matches => u,
            _ => {
                warn!(target: AUDIT, event = "LOGIN_FAILED", username = %req.username);
                return Err(TrackerError::InvalidCredentials);
            }
        };

        let identity = identity_of(&user);
        let token = self.tokens.issue(&identity)?;
        info!(target: AUDIT, event = "LOGIN_SUCCESS", user_id = user.id, username = %user.username);
        Ok(LoginResponse {
            token,
            user: identity,
        })
    }

    pub async fn list(&self) -> Result<Vec<PublicUser>, TrackerError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<PublicUser, TrackerError> {
        self.store
            .get_user(id)
            .await?
            .map(PublicUser::from)
            .ok_or(TrackerError::NotFound("User"))
    }

    /// Ensures the configured admin account exists and returns it. With
    /// seeding off, returns the account only if it is already there.
    pub async fn seed_admin(&self, admin: &AdminConfig) -> Result<Option<Identity>, TrackerError> {
        if let Some(existing) = self.store.find_user_by_username(&admin.username).await? {
            if admin.reset_password {
                let hash = self.hash(admin.password.clone()).await?;
                self.store
                    .set_password(admin.username.clone(), hash)
                    .await?;
                warn!(target: AUDIT, event = "ADMIN_PASSWORD_RESET", username = %admin.username);
            } else {
                debug!(username = %admin.username, "admin account already present");
            }
            return Ok(Some(identity_of(&existing)));
        }

        if !admin.seed {
            return Ok(None);
        }

        let hash = self.hash(admin.password.clone()).await?;
        let id = self
            .store
            .insert_user(
                admin.username.clone(),
                hash,
                admin.email.clone(),
                Utc::now(),
            )
            .await?;
        info!(target: AUDIT, event = "ADMIN_SEEDED", user_id = id, username = %admin.username);
        Ok(Some(Identity {
            id,
            username: admin.username.clone(),
            email: admin.email.clone(),
        }))
    }

    // bcrypt is CPU-bound; keep it off the async workers.
    async fn hash(&self, password: String) -> Result<String, TrackerError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, TrackerError> {
        let hasher = self.hasher.clone();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await?)
    }

    /// Builds the unknown-user hash ahead of the first login.
    pub async fn prepare(&self) -> Result<(), TrackerError> {
        self.dummy_hash().await.map(drop)
    }

    async fn dummy_hash(&self) -> Result<String, TrackerError> {
        if let Some(h) = self.dummy_hash.get() {
            return Ok(h.clone());
        }
        let h = self.hash("not-a-real-password".to_string()).await?;
        Ok(self.dummy_hash.get_or_init(|| h).clone())
    }
}

fn identity_of(user: &DbUser) -> Identity {
    Identity {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
    }
}
