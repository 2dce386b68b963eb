//! Shared state for request handlers

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::audit::{Auditor, ReportStore};
use crate::relay::TungsteniteConnector;

/// State shared across handlers
pub struct AppState<F, R> {
    pub auditor: Arc<Auditor<F, R>>,
    /// Same slot the auditor writes; read by the export routes
    pub reports: ReportStore,
    /// Voice-service dialer, one connection per relay session
    pub upstream: TungsteniteConnector,
    /// Cancelled on shutdown; relay sessions hold child tokens
    pub shutdown: CancellationToken,
}

impl<F, R> AppState<F, R>
where
    F: crate::checks::PageFetcher,
    R: crate::checks::PageRenderer,
{
    pub fn new(
        auditor: Auditor<F, R>,
        upstream: TungsteniteConnector,
        shutdown: CancellationToken,
    ) -> Self {
        let reports = auditor.store().clone();
        Self {
            auditor: Arc::new(auditor),
            reports,
            upstream,
            shutdown,
        }
    }
}

// Manual impl: F and R themselves need not be Clone
impl<F, R> Clone for AppState<F, R> {
    fn clone(&self) -> Self {
        Self {
            auditor: Arc::clone(&self.auditor),
            reports: self.reports.clone(),
            upstream: self.upstream.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}
