//! Route handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use super::{ApiError, AppState};
use crate::checks::{PageFetcher, PageRenderer};
use crate::models::Report;
use crate::relay::{ClientSocket, RelaySession};
use crate::reporters::pdf;

pub const PDF_FILENAME: &str = "audit-report.pdf";

#[derive(Debug, Deserialize)]
pub struct AuditRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// `POST /audit`
pub async fn run_audit<F: PageFetcher, R: PageRenderer>(
    State(state): State<AppState<F, R>>,
    body: Result<Json<AuditRequest>, JsonRejection>,
) -> Result<Json<Arc<Report>>, ApiError> {
    // An unreadable body is the same as a missing url
    let url = match body {
        Ok(Json(request)) => request.url.unwrap_or_default(),
        Err(rejection) => {
            debug!("Rejected audit body: {}", rejection);
            String::new()
        }
    };
    let report = state.auditor.audit(&url).await?;
    Ok(Json(report))
}

/// `GET /report`
pub async fn get_report<F: PageFetcher, R: PageRenderer>(
    State(state): State<AppState<F, R>>,
) -> Result<Json<Arc<Report>>, ApiError> {
    Ok(Json(state.reports.get().await?))
}

/// `GET /report.pdf`
pub async fn export_pdf<F: PageFetcher, R: PageRenderer>(
    State(state): State<AppState<F, R>>,
) -> Response {
    let report = match state.reports.get().await {
        Ok(report) => report,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    // Layout is CPU-bound
    let rendered = tokio::task::spawn_blocking(move || pdf::render(&report)).await;
    match rendered {
        Ok(Ok(bytes)) => (
            [
                (CONTENT_TYPE, "application/pdf".to_string()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{PDF_FILENAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(Err(e)) => ApiError::Export(format!("{e:#}")).into_response(),
        Err(e) => ApiError::Export(e.to_string()).into_response(),
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /ws` and `GET /`
pub async fn relay_socket<F: PageFetcher, R: PageRenderer>(
    State(state): State<AppState<F, R>>,
    ws: WebSocketUpgrade,
) -> Response {
    let connector = state.upstream.clone();
    let shutdown = state.shutdown.child_token();
    ws.on_upgrade(move |socket| async move {
        RelaySession::new(shutdown)
            .run(ClientSocket(socket), &connector)
            .await;
    })
}
