//! Site health scoring
//!
//! Reduces the four checker results into one 0-100 integer.
//!
//! # Scoring Formula
//!
//! ```text
//! Score = round(clamp(100 - Σ deductions, 0, 100))
//!
//! Deductions:
//!   Insecure transport (no https)        15
//!   Missing security header              4 each
//!   Accessibility issues                 min(1.5 × issues, 25)
//!   Load time > 4000 ms                  15
//!   Transfer size > 2,000,000 bytes      10
//!   Empty <title>                        5
//!   Empty meta description               5
//! ```
//!
//! All terms are additive, so evaluation order never changes the number. The
//! order above is the order deductions are reported in [`ScoreBreakdown`].
//!
//! # Example
//!
//! A plain-http site missing every security header, with 10 accessibility
//! issues, a 5 s load, 3 MB transferred and no title or description:
//!
//! 100 - 15 - 24 - 15 - 15 - 10 - 5 - 5 = 11

use serde::Serialize;

use crate::models::{AccessibilityResult, PerformanceResult, SecurityResult, SeoResult};

const INSECURE_TRANSPORT_PENALTY: f64 = 15.0;
const MISSING_HEADER_PENALTY: f64 = 4.0;
const ACCESSIBILITY_ISSUE_PENALTY: f64 = 1.5;
const MAX_ACCESSIBILITY_PENALTY: f64 = 25.0;
const SLOW_LOAD_THRESHOLD_MS: u64 = 4_000;
const SLOW_LOAD_PENALTY: f64 = 15.0;
const HEAVY_PAGE_THRESHOLD_BYTES: u64 = 2_000_000;
const HEAVY_PAGE_PENALTY: f64 = 10.0;
const MISSING_TITLE_PENALTY: f64 = 5.0;
const MISSING_DESCRIPTION_PENALTY: f64 = 5.0;

/// One applied deduction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deduction {
    pub reason: String,
    pub points: f64,
}

/// Complete score breakdown for transparency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Final clamped, rounded score
    pub score: u8,
    /// 100 minus every deduction, before clamping
    pub raw_score: f64,
    /// Deductions that applied, in formula order
    pub deductions: Vec<Deduction>,
}

/// Borrowed view of everything the score depends on
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs<'a> {
    pub security: &'a SecurityResult,
    pub seo: &'a SeoResult,
    pub performance: &'a PerformanceResult,
    pub accessibility: &'a AccessibilityResult,
}

/// Calculate the score only
pub fn score(inputs: ScoreInputs<'_>) -> u8 {
    breakdown(inputs).score
}

/// Calculate the score with every deduction listed
pub fn breakdown(inputs: ScoreInputs<'_>) -> ScoreBreakdown {
    let mut deductions = Vec::new();
    let mut push = |reason: String, points: f64| {
        if points > 0.0 {
            deductions.push(Deduction { reason, points });
        }
    };

    if !inputs.security.uses_secure_transport {
        push("Site is not served over HTTPS".into(), INSECURE_TRANSPORT_PENALTY);
    }

    let missing = inputs.security.missing_headers.len();
    push(
        format!("{} security header(s) missing", missing),
        MISSING_HEADER_PENALTY * missing as f64,
    );

    let issues = inputs.accessibility.issue_count;
    push(
        format!("{} accessibility issue(s)", issues),
        (ACCESSIBILITY_ISSUE_PENALTY * issues as f64).min(MAX_ACCESSIBILITY_PENALTY),
    );

    if inputs.performance.load_time_ms > SLOW_LOAD_THRESHOLD_MS {
        push(
            format!(
                "Load time {} ms exceeds {} ms",
                inputs.performance.load_time_ms, SLOW_LOAD_THRESHOLD_MS
            ),
            SLOW_LOAD_PENALTY,
        );
    }

    if inputs.performance.total_transfer_bytes > HEAVY_PAGE_THRESHOLD_BYTES {
        push(
            format!(
                "Transfer size {} bytes exceeds {} bytes",
                inputs.performance.total_transfer_bytes, HEAVY_PAGE_THRESHOLD_BYTES
            ),
            HEAVY_PAGE_PENALTY,
        );
    }

    if inputs.seo.title.is_empty() {
        push("Page has no <title>".into(), MISSING_TITLE_PENALTY);
    }

    if inputs.seo.meta_description.is_empty() {
        push("Page has no meta description".into(), MISSING_DESCRIPTION_PENALTY);
    }

    let raw_score = 100.0 - deductions.iter().map(|d| d.points).sum::<f64>();
    let score = raw_score.clamp(0.0, 100.0).round() as u8;

    ScoreBreakdown {
        score,
        raw_score,
        deductions,
    }
}
