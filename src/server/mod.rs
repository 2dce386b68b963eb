//! HTTP and WebSocket front end
//!
//! | Route              | Purpose                                   |
//! |--------------------|-------------------------------------------|
//! | `POST /audit`      | run an audit, return the Report           |
//! | `GET /report`      | last Report as JSON                       |
//! | `GET /report.pdf`  | last Report as a PDF attachment           |
//! | `GET /health`      | liveness                                  |
//! | `GET /ws`, `GET /` | voice-command relay (WebSocket upgrade)   |

mod error;
mod handlers;
mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::checks::{PageFetcher, PageRenderer};

/// Build the application router
pub fn router<F: PageFetcher, R: PageRenderer>(state: AppState<F, R>) -> Router {
    Router::new()
        .route("/audit", post(handlers::run_audit::<F, R>))
        .route("/report", get(handlers::get_report::<F, R>))
        .route("/report.pdf", get(handlers::export_pdf::<F, R>))
        .route("/health", get(handlers::health))
        .route("/ws", get(handlers::relay_socket::<F, R>))
        .route("/", get(handlers::relay_socket::<F, R>))
        .with_state(state)
}

/// Serve until the state's shutdown token is cancelled.
pub async fn serve<F: PageFetcher, R: PageRenderer>(
    listener: TcpListener,
    state: AppState<F, R>,
) -> std::io::Result<()> {
    let shutdown = state.shutdown.clone();
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("Server stopped");
    Ok(())
}
