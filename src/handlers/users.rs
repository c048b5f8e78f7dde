use axum::{Json, extract::State};

use crate::db::models::PublicUser;
use crate::error::TrackerError;
use crate::middleware::{AuthUser, PathParam};
use crate::server::router::TrackerState;

/// Password hashes never leave the store layer.
pub async fn list(
    State(state): State<TrackerState>,
    _user: AuthUser,
) -> Result<Json<Vec<PublicUser>>, TrackerError> {
    Ok(Json(state.services.users.list().await?))
}

pub async fn get(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<PublicUser>, TrackerError> {
    Ok(Json(state.services.users.get_by_id(id).await?))
}
