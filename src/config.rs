//! Layered runtime configuration.
//!
//! Sources, later wins:
//! - compiled defaults
//! - `config.toml` in the working directory (optional)
//! - `TRACKER_*` environment variables, `__` separating sections
//!   (e.g. `TRACKER_AUTH__JWT_SECRET`)
//! - the plain `PORT`, `JWT_SECRET`, `CORS_ORIGIN` and `DATABASE_URL` variables

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

pub const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub host: String,
    pub port: u16,
    pub loglevel: String,
    pub environment: Environment,
    #[serde(deserialize_with = "one_or_many")]
    pub cors_origins: Vec<String>,
}

/// `CORS_ORIGIN` arrives as a single string; the TOML form is a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(origin) => vec![origin],
        OneOrMany::Many(origins) => origins,
    })
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            loglevel: "info".to_string(),
            environment: Environment::Development,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:testdb.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// Skip token validation and act as a fixed identity. Rejected in production.
    pub dev_bypass: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            bcrypt_cost: 10,
            dev_bypass: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub seed: bool,
    pub username: String,
    pub password: String,
    pub email: String,
    /// Overwrite the existing admin password with `password` at startup.
    pub reset_password: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            seed: true,
            username: "admin".to_string(),
            password: "admin123".to_string(),
            email: "admin@testdb.com".to_string(),
            reset_password: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("TRACKER_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "basic.port".into()))
            .merge(
                Env::raw()
                    .only(&["JWT_SECRET"])
                    .map(|_| "auth.jwt_secret".into()),
            )
            .merge(
                Env::raw()
                    .only(&["CORS_ORIGIN"])
                    .map(|_| "basic.cors_origins".into()),
            )
            .merge(
                Env::raw()
                    .only(&["DATABASE_URL"])
                    .map(|_| "database.url".into()),
            )
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.basic.host, self.basic.port).parse()
    }

    pub fn is_production(&self) -> bool {
        self.basic.environment == Environment::Production
    }

    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }
}
