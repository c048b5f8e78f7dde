pub mod auth;
pub mod extract;

pub use auth::AuthUser;
pub use extract::{JsonBody, PathParam};
