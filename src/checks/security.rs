//! Transport security probe
//!
//! One GET (redirects followed). Records whether the final response came
//! over https and which of the required hardening headers it carried.
//! A failed fetch is not an error: it degrades to "insecure, every header
//! missing" so the audit can still complete.

use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::{FetchedPage, PageFetcher};
use crate::models::{NormalizedUrl, SecurityResult};

/// Headers every audited site is expected to send (lower-case).
pub const REQUIRED_HEADERS: [&str; 6] = [
    "content-security-policy",
    "strict-transport-security",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
    "permissions-policy",
];

/// Run the security check. Never fails.
pub async fn check<F: PageFetcher>(fetcher: &F, url: &NormalizedUrl) -> SecurityResult {
    match fetcher.fetch(url).await {
        Ok(page) => {
            let result = evaluate(&page);
            debug!(
                "Security: {} secure={} missing={:?}",
                url, result.uses_secure_transport, result.missing_headers
            );
            result
        }
        Err(e) => {
            warn!("Security check for {} degraded: {}", url, e);
            degraded()
        }
    }
}

/// Classify a fetched response against [`REQUIRED_HEADERS`].
pub fn evaluate(page: &FetchedPage) -> SecurityResult {
    let sent: BTreeSet<String> = page
        .headers
        .keys()
        .map(|name| name.to_ascii_lowercase())
        .collect();

    let (present_headers, missing_headers): (BTreeSet<String>, BTreeSet<String>) =
        REQUIRED_HEADERS
            .iter()
            .map(|h| h.to_string())
            .partition(|h| sent.contains(h));

    SecurityResult {
        uses_secure_transport: page.final_url.scheme() == "https",
        present_headers,
        missing_headers,
    }
}

/// Worst-case result used when the site could not be fetched.
pub fn degraded() -> SecurityResult {
    SecurityResult {
        uses_secure_transport: false,
        present_headers: BTreeSet::new(),
        missing_headers: REQUIRED_HEADERS.iter().map(|h| h.to_string()).collect(),
    }
}
