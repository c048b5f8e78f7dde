use axum::{Json, extract::State, http::StatusCode};

use crate::db::models::Mapping;
use crate::error::TrackerError;
use crate::middleware::{AuthUser, JsonBody, PathParam};
use crate::server::router::TrackerState;
use crate::types::{Created, MappingRequest, Message};

pub async fn list(
    State(state): State<TrackerState>,
    _user: AuthUser,
) -> Result<Json<Vec<Mapping>>, TrackerError> {
    Ok(Json(state.services.mappings.list().await?))
}

pub async fn create(
    State(state): State<TrackerState>,
    _user: AuthUser,
    JsonBody(req): JsonBody<MappingRequest>,
) -> Result<(StatusCode, Json<Created>), TrackerError> {
    let id = state.services.mappings.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            message: "Mapping created successfully".to_string(),
        }),
    ))
}

pub async fn delete(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Message>, TrackerError> {
    state.services.mappings.delete(id).await?;
    Ok(Json(Message::new("Mapping deleted successfully")))
}
