use axum::extract::{FromRequest, FromRequestParts};

use crate::error::TrackerError;

/// JSON request body whose rejection is a `TrackerError`, so malformed or
/// incomplete bodies get a 400 with an `{"error": ...}` body.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(TrackerError))]
pub struct JsonBody<T>(pub T);

/// Path parameters with the same rejection shape as `JsonBody`.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(TrackerError))]
pub struct PathParam<T>(pub T);
