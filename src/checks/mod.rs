//! The four independent site probes
//!
//! Each checker takes a [`NormalizedUrl`] and produces one result type:
//!
//! - [`security`] - HTTPS and the six hardening headers (degrades, never fails)
//! - [`seo`] - title, meta description, headings, image alt text
//! - [`performance`] - load time and transfer size from a real browser
//! - [`accessibility`] - WCAG 2 A/AA scan of the rendered page
//!
//! I/O sits behind two seams so the rules can run against fakes:
//! [`PageFetcher`] for plain HTTP and [`PageRenderer`] for the browser.

pub mod accessibility;
mod browser;
mod http;
pub mod performance;
pub mod security;
pub mod seo;

pub use browser::{BrowserSession, ChromeRenderer};
pub use http::HttpFetcher;

use std::collections::HashMap;
use std::future::Future;

use crate::error::CheckError;
use crate::models::{AccessibilityIssue, NormalizedUrl, PerformanceResult};

/// A fetched HTTP response, after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL of the final response in the redirect chain
    pub final_url: reqwest::Url,
    pub status: u16,
    /// Header name (lower-cased) to value
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl FetchedPage {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_ascii_lowercase() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Plain HTTP access used by the security and SEO checkers
pub trait PageFetcher: Send + Sync + 'static {
    /// Issue one GET, following redirects.
    fn fetch(
        &self,
        url: &NormalizedUrl,
    ) -> impl Future<Output = Result<FetchedPage, CheckError>> + Send;
}

/// Real-browser access used by the performance and accessibility checkers
///
/// Implementations must release whatever browser context they acquire on
/// every path, including errors and cancellation.
pub trait PageRenderer: Send + Sync + 'static {
    /// Navigate and measure once the network is quiet.
    fn measure(
        &self,
        url: &NormalizedUrl,
    ) -> impl Future<Output = Result<PerformanceResult, CheckError>> + Send;

    /// Run a WCAG 2 AA scan and return every issue in scan order.
    fn scan_accessibility(
        &self,
        url: &NormalizedUrl,
    ) -> impl Future<Output = Result<Vec<AccessibilityIssue>, CheckError>> + Send;
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-memory probes for aggregator and server tests

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves one canned response (or a connection error) for every URL.
    #[derive(Clone)]
    pub struct FakeFetcher {
        pub page: Option<FetchedPage>,
        pub calls: Arc<AtomicUsize>,
    }

    impl FakeFetcher {
        pub fn serving(final_url: &str, headers: &[(&str, &str)], body: &str) -> Self {
            Self {
                page: Some(FetchedPage {
                    final_url: reqwest::Url::parse(final_url).unwrap(),
                    status: 200,
                    headers: headers
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    body: body.to_string(),
                }),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn unreachable() -> Self {
            Self {
                page: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, _url: &NormalizedUrl) -> Result<FetchedPage, CheckError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.page
                .clone()
                .ok_or_else(|| CheckError::Script("connection refused".into()))
        }
    }

    /// Returns fixed metrics and issues, or fails the chosen operation.
    #[derive(Clone, Default)]
    pub struct FakeRenderer {
        pub performance: PerformanceResult,
        pub issues: Vec<AccessibilityIssue>,
        pub fail_measure: bool,
        pub fail_scan: bool,
    }

    impl PageRenderer for FakeRenderer {
        async fn measure(&self, _url: &NormalizedUrl) -> Result<PerformanceResult, CheckError> {
            if self.fail_measure {
                return Err(CheckError::Launch("no chrome in test".into()));
            }
            Ok(self.performance)
        }

        async fn scan_accessibility(
            &self,
            _url: &NormalizedUrl,
        ) -> Result<Vec<AccessibilityIssue>, CheckError> {
            if self.fail_scan {
                return Err(CheckError::Timeout(std::time::Duration::from_secs(60)));
            }
            Ok(self.issues.clone())
        }
    }

    pub fn issue(code: &str, message: &str) -> AccessibilityIssue {
        AccessibilityIssue {
            code: code.to_string(),
            message: message.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::FakeFetcher;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let fetcher = FakeFetcher::serving(
            "https://example.com/",
            &[("X-Frame-Options", "DENY")],
            "",
        );
        let page = fetcher.page.unwrap();
        assert_eq!(page.header("x-frame-options"), Some("DENY"));
        assert_eq!(page.header("X-FRAME-OPTIONS"), Some("DENY"));
        assert_eq!(page.header("referrer-policy"), None);
    }
}
