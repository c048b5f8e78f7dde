use axum::{Json, extract::State};

use crate::db::models::DashboardSummary;
use crate::error::TrackerError;
use crate::middleware::AuthUser;
use crate::server::router::TrackerState;

pub async fn summary(
    State(state): State<TrackerState>,
    _user: AuthUser,
) -> Result<Json<DashboardSummary>, TrackerError> {
    Ok(Json(state.services.dashboard.summary().await?))
}
