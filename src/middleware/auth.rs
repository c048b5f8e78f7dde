use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::sync::Arc;

use crate::auth::{Authenticator, Identity};
use crate::error::TrackerError;

/// The authenticated caller of a protected route.
///
/// Resolved by whichever `Authenticator` was selected at startup; a request
/// that fails authentication never reaches the handler.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<dyn Authenticator>: FromRef<S>,
{
    type Rejection = TrackerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Arc::<dyn Authenticator>::from_ref(state);
        authenticator.authenticate(&parts.headers).map(Self)
    }
}
