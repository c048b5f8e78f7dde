use axum::{Json, extract::State, http::StatusCode};

use crate::db::models::{Requirement, TestCase};
use crate::error::TrackerError;
use crate::middleware::{AuthUser, JsonBody, PathParam};
use crate::server::router::TrackerState;
use crate::types::{Created, Message, RequirementFields};

pub async fn list(
    State(state): State<TrackerState>,
    _user: AuthUser,
) -> Result<Json<Vec<Requirement>>, TrackerError> {
    Ok(Json(state.services.requirements.list().await?))
}

pub async fn get(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Requirement>, TrackerError> {
    Ok(Json(state.services.requirements.get_by_id(id).await?))
}

/// POST /api/requirements; the caller becomes `created_by`.
pub async fn create(
    State(state): State<TrackerState>,
    AuthUser(user): AuthUser,
    JsonBody(fields): JsonBody<RequirementFields>,
) -> Result<(StatusCode, Json<Created>), TrackerError> {
    let id = state.services.requirements.create(fields, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            message: "Requirement created successfully".to_string(),
        }),
    ))
}

pub async fn update(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
    JsonBody(fields): JsonBody<RequirementFields>,
) -> Result<Json<Message>, TrackerError> {
    state.services.requirements.update(id, fields).await?;
    Ok(Json(Message::new("Requirement updated successfully")))
}

pub async fn delete(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Message>, TrackerError> {
    state.services.requirements.delete(id).await?;
    Ok(Json(Message::new("Requirement deleted successfully")))
}

/// GET /api/requirements/{id}/test-cases
pub async fn test_cases(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Vec<TestCase>>, TrackerError> {
    Ok(Json(state.services.requirements.test_cases(id).await?))
}
