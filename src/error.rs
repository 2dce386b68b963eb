//! Error types shared across the audit path
//!
//! Checker-level failures are [`CheckError`]s. The aggregator either folds
//! them into a degraded result (security) or wraps them in
//! [`AuditError::Checker`], which aborts the whole audit.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which of the four probes produced a result or an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckerKind {
    Security,
    Seo,
    Performance,
    Accessibility,
}

impl fmt::Display for CheckerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckerKind::Security => write!(f, "security"),
            CheckerKind::Seo => write!(f, "seo"),
            CheckerKind::Performance => write!(f, "performance"),
            CheckerKind::Accessibility => write!(f, "accessibility"),
        }
    }
}

/// Errors a single checker can hit
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser automation failed: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Could not launch browser: {0}")]
    Launch(String),

    #[error("Page script failed: {0}")]
    Script(String),

    #[error("Timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Errors surfaced by [`crate::audit::Auditor::audit`]
#[derive(Error, Debug)]
pub enum AuditError {
    /// Missing or malformed input URL (user-correctable)
    #[error("{0}")]
    Validation(String),

    /// A checker without a safe default failed; no report is produced
    #[error("{checker} check failed: {source}")]
    Checker {
        checker: CheckerKind,
        #[source]
        source: CheckError,
    },
}

impl AuditError {
    pub fn checker(checker: CheckerKind, source: CheckError) -> Self {
        AuditError::Checker { checker, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AuditError::Validation(_))
    }
}

/// No audit has completed yet, so there is nothing to export.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No report available yet. Run an audit first by POSTing a URL to /audit.")]
pub struct NotFoundError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_error_message_names_checker() {
        let err = AuditError::checker(
            CheckerKind::Accessibility,
            CheckError::Timeout(Duration::from_secs(60)),
        );
        assert_eq!(err.to_string(), "accessibility check failed: Timed out after 60s");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_error_is_flagged() {
        let err = AuditError::Validation("URL is required".into());
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "URL is required");
    }
}
