use axum::{Json, extract::State, http::StatusCode};

use crate::db::models::{Requirement, TestCase};
use crate::error::TrackerError;
use crate::middleware::{AuthUser, JsonBody, PathParam};
use crate::server::router::TrackerState;
use crate::types::{Created, Message, TestCaseFields};

pub async fn list(
    State(state): State<TrackerState>,
    _user: AuthUser,
) -> Result<Json<Vec<TestCase>>, TrackerError> {
    Ok(Json(state.services.test_cases.list().await?))
}

pub async fn get(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<TestCase>, TrackerError> {
    Ok(Json(state.services.test_cases.get_by_id(id).await?))
}

pub async fn create(
    State(state): State<TrackerState>,
    AuthUser(user): AuthUser,
    JsonBody(fields): JsonBody<TestCaseFields>,
) -> Result<(StatusCode, Json<Created>), TrackerError> {
    let id = state.services.test_cases.create(fields, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            message: "Test case created successfully".to_string(),
        }),
    ))
}

pub async fn update(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
    JsonBody(fields): JsonBody<TestCaseFields>,
) -> Result<Json<Message>, TrackerError> {
    state.services.test_cases.update(id, fields).await?;
    Ok(Json(Message::new("Test case updated successfully")))
}

pub async fn delete(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Message>, TrackerError> {
    state.services.test_cases.delete(id).await?;
    Ok(Json(Message::new("Test case deleted successfully")))
}

/// GET /api/test-cases/{id}/requirements
pub async fn requirements(
    State(state): State<TrackerState>,
    _user: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Vec<Requirement>>, TrackerError> {
    Ok(Json(state.services.test_cases.requirements(id).await?))
}
