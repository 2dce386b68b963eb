//! reqwest-backed [`PageFetcher`]

use reqwest::redirect::Policy;
use std::collections::HashMap;
use tracing::debug;

use super::{FetchedPage, PageFetcher};
use crate::config::AuditSettings;
use crate::error::CheckError;
use crate::models::NormalizedUrl;

const MAX_REDIRECTS: usize = 10;

/// Shared HTTP client for the security and SEO probes
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(settings: &AuditSettings) -> Result<Self, CheckError> {
        Ok(Self {
            client: build_client(settings)?,
        })
    }
}

/// Client carrying the configured user agent, redirect limit and timeout.
pub(crate) fn build_client(settings: &AuditSettings) -> Result<reqwest::Client, CheckError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .redirect(Policy::limited(MAX_REDIRECTS));
    if let Some(timeout) = settings.request_timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &NormalizedUrl) -> Result<FetchedPage, CheckError> {
        let response = self.client.get(url.as_str()).send().await?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        // Non-2xx responses still carry the site's headers and markup.
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        debug!(
            "Fetched {} -> {} ({}, {} bytes)",
            url,
            final_url,
            status,
            body.len()
        );

        Ok(FetchedPage {
            final_url,
            status,
            headers,
            body,
        })
    }
}
