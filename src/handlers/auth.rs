use axum::{Json, extract::State, http::StatusCode};

use crate::error::TrackerError;
use crate::middleware::JsonBody;
use crate::server::router::TrackerState;
use crate::types::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

/// POST /api/auth/login
pub async fn login(
    State(state): State<TrackerState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, TrackerError> {
    Ok(Json(state.services.users.login(req).await?))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<TrackerState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), TrackerError> {
    let user_id = state.services.users.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user_id,
        }),
    ))
}
