//! API error responses
//!
//! Every JSON error body has a stable `error` field and free-text `details`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error::{AuditError, NotFoundError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    AuditFailed(String),

    #[error(transparent)]
    NoReport(#[from] NotFoundError),

    #[error("{0}")]
    Export(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AuditFailed(_) | ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NoReport(_) => StatusCode::NOT_FOUND,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "Invalid request",
            ApiError::AuditFailed(_) => "Audit failed",
            ApiError::NoReport(_) => "No report",
            ApiError::Export(_) => "Report export failed",
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Validation(msg) => ApiError::InvalidRequest(msg),
            other => ApiError::AuditFailed(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.label(),
            "details": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
