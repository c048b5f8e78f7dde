//! Database module: schema, row models, SQL and the actor that serializes access.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows, plus insert/patch payloads
//! - `schema.rs`: SQL DDL for initializing the database (SQLite)
//! - `sqlite.rs`: queries over the single connection
//! - `store_actor.rs`: the actor owning that connection; one operation at a time

pub mod models;
pub mod schema;
pub mod sqlite;
pub mod store_actor;

pub use models::{DbUser, Mapping, PublicUser, Requirement, TestCase};
pub use schema::SQLITE_INIT;
pub use sqlite::TrackerStorage;
pub use store_actor::{StoreHandle, spawn};
