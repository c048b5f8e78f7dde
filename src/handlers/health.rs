use axum::Json;
use chrono::Utc;

use crate::types::Health;

/// GET /api/health; unauthenticated and never touches the store.
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}
