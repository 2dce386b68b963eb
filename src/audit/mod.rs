//! Audit orchestration
//!
//! [`Auditor::audit`] normalizes the URL, runs the four checkers
//! concurrently, scores the combined result and publishes it to the
//! [`ReportStore`]. If a checker without a safe default fails, the remaining
//! checkers are cancelled and nothing is stored.

mod store;

pub use store::ReportStore;

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::checks::{accessibility, performance, security, seo, PageFetcher, PageRenderer};
use crate::config::AuditSettings;
use crate::error::{AuditError, CheckerKind};
use crate::models::{NormalizedUrl, Report};
use crate::scoring::{self, ScoreBreakdown, ScoreInputs};

/// Runs audits and records the latest report
pub struct Auditor<F, R> {
    fetcher: F,
    renderer: R,
    settings: AuditSettings,
    store: ReportStore,
}

impl<F: PageFetcher, R: PageRenderer> Auditor<F, R> {
    pub fn new(fetcher: F, renderer: R, settings: AuditSettings, store: ReportStore) -> Self {
        Self {
            fetcher,
            renderer,
            settings,
            store,
        }
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Audit `raw_url` and return the stored report.
    pub async fn audit(&self, raw_url: &str) -> Result<Arc<Report>, AuditError> {
        self.audit_explained(raw_url).await.map(|(report, _)| report)
    }

    /// Like [`Auditor::audit`], also returning how the score was reached.
    pub async fn audit_explained(
        &self,
        raw_url: &str,
    ) -> Result<(Arc<Report>, ScoreBreakdown), AuditError> {
        let url = NormalizedUrl::parse(raw_url)?;
        let started = Instant::now();
        info!("Auditing {}", url);

        let (report, breakdown) = match self.run_checks(&url).await {
            Ok(done) => done,
            Err(e) => {
                error!("Audit of {} failed: {}", url, e);
                return Err(e);
            }
        };

        let report = Arc::new(report);
        self.store.set(report.clone()).await;
        info!(
            "Audit of {} complete: score {} in {:.1}s",
            url,
            report.score,
            started.elapsed().as_secs_f64()
        );
        Ok((report, breakdown))
    }

    async fn run_checks(&self, url: &NormalizedUrl) -> Result<(Report, ScoreBreakdown), AuditError> {
        let security = async { Ok::<_, AuditError>(security::check(&self.fetcher, url).await) };
        let seo = async {
            seo::check(&self.fetcher, url)
                .await
                .map_err(|e| AuditError::checker(CheckerKind::Seo, e))
        };
        let performance = async {
            performance::check(&self.renderer, url)
                .await
                .map_err(|e| AuditError::checker(CheckerKind::Performance, e))
        };
        let accessibility = async {
            accessibility::check(&self.renderer, url, self.settings.max_accessibility_issues)
                .await
                .map_err(|e| AuditError::checker(CheckerKind::Accessibility, e))
        };

        let (security, seo, performance, accessibility) =
            tokio::try_join!(security, seo, performance, accessibility)?;

        let breakdown = scoring::breakdown(ScoreInputs {
            security: &security,
            seo: &seo,
            performance: &performance,
            accessibility: &accessibility,
        });

        let report = Report {
            url: url.clone(),
            score: breakdown.score,
            security,
            seo,
            performance,
            accessibility,
        };
        Ok((report, breakdown))
    }
}
