//! Headless Chrome over the DevTools protocol
//!
//! Every probe gets its own browser process with a throwaway profile, so
//! concurrent audits never share cookies, cache or service workers.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::accessibility::scan_page;
use super::http::build_client;
use super::performance::measure_page;
use super::PageRenderer;
use crate::config::{AuditSettings, BrowserSettings};
use crate::error::CheckError;
use crate::models::{AccessibilityIssue, NormalizedUrl, PerformanceResult};

/// One running browser plus the task driving its CDP connection.
///
/// Dropping the session stops the handler task and the browser process;
/// [`BrowserSession::close`] shuts down gracefully instead.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    _profile: tempfile::TempDir,
}

impl BrowserSession {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, CheckError> {
        let profile = tempfile::Builder::new()
            .prefix("sitescope-chrome-")
            .tempdir()
            .map_err(|e| CheckError::Launch(format!("profile directory: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .no_sandbox();
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(CheckError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CheckError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            _profile: profile,
        })
    }

    pub async fn new_page(&self) -> Result<Page, CheckError> {
        Ok(self.browser.new_page("about:blank").await?)
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Waiting for browser exit: {}", e);
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Evaluate a JavaScript expression and deserialize its (awaited) value.
pub(crate) async fn evaluate<T: DeserializeOwned>(
    page: &Page,
    expression: &str,
) -> Result<T, CheckError> {
    let params = EvaluateParams::builder()
        .expression(expression)
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(CheckError::Script)?;
    page.evaluate_expression(params)
        .await?
        .into_value::<T>()
        .map_err(|e| CheckError::Script(e.to_string()))
}

/// [`PageRenderer`] that launches a fresh Chrome per call.
#[derive(Clone)]
pub struct ChromeRenderer {
    browser: BrowserSettings,
    audit: AuditSettings,
    client: reqwest::Client,
    axe_source: Arc<OnceCell<String>>,
}

impl ChromeRenderer {
    pub fn new(browser: BrowserSettings, audit: AuditSettings) -> Result<Self, CheckError> {
        Ok(Self {
            client: build_client(&audit)?,
            browser,
            audit,
            axe_source: Arc::new(OnceCell::new()),
        })
    }

    /// axe-core source, fetched once and reused across audits.
    async fn axe_source(&self) -> Result<&str, CheckError> {
        let source = self
            .axe_source
            .get_or_try_init(|| async {
                let location = self.audit.axe_script_url.as_str();
                if location.starts_with("http://") || location.starts_with("https://") {
                    debug!("Downloading axe-core from {}", location);
                    let response = self.client.get(location).send().await?.error_for_status()?;
                    Ok(response.text().await?)
                } else {
                    tokio::fs::read_to_string(location).await.map_err(|e| {
                        CheckError::Script(format!("could not read axe script {location}: {e}"))
                    })
                }
            })
            .await?;
        Ok(source.as_str())
    }
}

impl PageRenderer for ChromeRenderer {
    async fn measure(&self, url: &NormalizedUrl) -> Result<PerformanceResult, CheckError> {
        let session = BrowserSession::launch(&self.browser).await?;
        let outcome = async {
            let page = session.new_page().await?;
            measure_page(&page, url, &self.browser).await
        }
        .await;
        session.close().await;
        outcome
    }

    async fn scan_accessibility(
        &self,
        url: &NormalizedUrl,
    ) -> Result<Vec<AccessibilityIssue>, CheckError> {
        let limit = self.audit.accessibility_timeout;
        let axe = tokio::time::timeout(limit, self.axe_source())
            .await
            .unwrap_or(Err(CheckError::Timeout(limit)))?;

        let session = BrowserSession::launch(&self.browser).await?;
        let outcome = tokio::time::timeout(limit, async {
            let page = session.new_page().await?;
            page.goto(url.as_str()).await?;
            scan_page(&page, axe).await
        })
        .await
        .unwrap_or(Err(CheckError::Timeout(limit)));
        session.close().await;
        outcome
    }
}
