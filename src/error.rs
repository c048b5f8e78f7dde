use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

use crate::auth::token::TokenError;

#[derive(Debug, ThisError)]
pub enum TrackerError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token rejected: {0}")]
    Token(#[from] TokenError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Token issue error: {0}")]
    TokenIssue(#[from] jsonwebtoken::errors::Error),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl TrackerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TrackerError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        TrackerError::Conflict(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            TrackerError::Unauthorized
            | TrackerError::InvalidCredentials
            | TrackerError::Token(_) => StatusCode::UNAUTHORIZED,
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::Conflict(_) | TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::Database(_)
            | TrackerError::RactorError(_)
            | TrackerError::PasswordHash(_)
            | TrackerError::TokenIssue(_)
            | TrackerError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            TrackerError::Unauthorized => "Unauthorized".to_string(),
            TrackerError::InvalidCredentials => "Invalid credentials".to_string(),
            TrackerError::Token(_) => "Invalid or expired token".to_string(),
            TrackerError::NotFound(_)
            | TrackerError::Conflict(_)
            | TrackerError::Validation(_) => self.to_string(),
            TrackerError::Database(_) | TrackerError::RactorError(_) => {
                error!(error = %self, "store operation failed");
                "Database error".to_string()
            }
            TrackerError::PasswordHash(_) | TrackerError::TokenIssue(_) | TrackerError::Join(_) => {
                error!(error = %self, "internal failure");
                "Internal server error".to_string()
            }
        };
        (status, Json(ApiErrorBody { error: message })).into_response()
    }
}

// Extractor rejections answer 400 in the same `{"error": ...}` shape as
// everything else.
impl From<JsonRejection> for TrackerError {
    fn from(rejection: JsonRejection) -> Self {
        TrackerError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for TrackerError {
    fn from(rejection: PathRejection) -> Self {
        TrackerError::Validation(rejection.body_text())
    }
}

/// Every failed request answers with `{"error": "..."}`.
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Driver duplicate-key errors become `Conflict`; everything else stays a store error.
pub(crate) fn map_unique_violation(err: SqlxError, msg: &str) -> TrackerError {
    match &err {
        SqlxError::Database(db) if db.is_unique_violation() => TrackerError::conflict(msg),
        _ => TrackerError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: TrackerError) -> (StatusCode, String) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, String::from_utf8(bytes.to_vec()).expect("utf-8"))
    }

    #[tokio::test]
    async fn not_found_names_the_resource() {
        let (status, body) = body_of(TrackerError::NotFound("Requirement")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, r#"{"error":"Requirement not found"}"#);
    }

    #[tokio::test]
    async fn store_errors_do_not_leak_details() {
        let (status, body) =
            body_of(TrackerError::Database(SqlxError::Protocol("boom".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"Database error"}"#);
    }

    #[tokio::test]
    async fn token_failures_are_unauthorized() {
        let (status, body) = body_of(TrackerError::Token(TokenError::Expired)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"Invalid or expired token"}"#);
    }
}
