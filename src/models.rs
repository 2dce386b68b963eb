//! Core data models for sitescope
//!
//! These models flow from the checkers through the aggregator into the
//! report store, the reporters and the HTTP API. Everything serializes with
//! camelCase field names because the browser frontend consumes them as-is.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use crate::error::AuditError;

/// Scheme prepended when the user omits one.
pub const DEFAULT_SCHEME: &str = "https://";

/// Matches an explicit `scheme://` prefix (RFC 3986 scheme grammar).
fn scheme_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme regex is valid")
    })
}

/// A URL that is guaranteed to carry an explicit http(s) scheme and to parse
/// as an absolute URL.
///
/// Inputs that already have a scheme are kept verbatim (after trimming), so
/// normalization is the identity on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Normalize raw user input.
    ///
    /// Empty input, unsupported schemes and unparseable URLs are rejected
    /// with [`AuditError::Validation`].
    pub fn parse(raw: &str) -> Result<Self, AuditError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AuditError::Validation("URL is required".to_string()));
        }

        let candidate = if scheme_prefix().is_match(trimmed) {
            trimmed.to_string()
        } else {
            format!("{DEFAULT_SCHEME}{trimmed}")
        };

        let parsed = reqwest::Url::parse(&candidate).map_err(|e| {
            AuditError::Validation(format!("'{}' is not a valid URL: {}", trimmed, e))
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AuditError::Validation(format!(
                    "Unsupported scheme '{}': only http and https can be audited",
                    other
                )))
            }
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(AuditError::Validation(format!(
                "'{}' has no host",
                trimmed
            )));
        }

        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of the transport-security probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityResult {
    pub uses_secure_transport: bool,
    pub present_headers: BTreeSet<String>,
    pub missing_headers: BTreeSet<String>,
}

/// On-page SEO signals extracted from the served HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeoResult {
    pub title: String,
    pub meta_description: String,
    pub h1_count: u64,
    pub images_missing_alt: u64,
}

/// Load metrics read from a real browser once the network went quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResult {
    pub load_time_ms: u64,
    pub resource_count: u64,
    pub total_transfer_bytes: u64,
    pub dom_node_count: u64,
}

/// A single WCAG violation on one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityIssue {
    /// Rule identifier (e.g. `image-alt`)
    pub code: String,
    /// Human-readable description of the failure
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// WCAG2AA scan summary.
///
/// `issue_count` is the total found by the scan; `issues` may be a capped
/// prefix of that list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityResult {
    pub issue_count: u64,
    pub issues: Vec<AccessibilityIssue>,
}

/// The complete, scored audit of one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub url: NormalizedUrl,
    pub score: u8,
    pub security: SecurityResult,
    pub seo: SeoResult,
    pub performance: PerformanceResult,
    pub accessibility: AccessibilityResult,
}
