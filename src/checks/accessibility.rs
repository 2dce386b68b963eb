//! WCAG 2 A/AA accessibility scan
//!
//! The page is rendered in a headless browser and scanned with axe-core.
//! Every failing node becomes one [`AccessibilityIssue`]. The list is capped
//! before it goes into the report; `issue_count` always reflects the full
//! total.

use chromiumoxide::Page;
use serde::Deserialize;
use tracing::debug;

use super::browser::evaluate;
use super::PageRenderer;
use crate::error::CheckError;
use crate::models::{AccessibilityIssue, AccessibilityResult, NormalizedUrl};

/// Rule tags passed to axe: WCAG 2.0 and 2.1 at levels A and AA.
pub const WCAG_TAGS: [&str; 4] = ["wcag2a", "wcag2aa", "wcag21a", "wcag21aa"];

/// Run the accessibility check, keeping at most `max_issues` entries.
pub async fn check<R: PageRenderer>(
    renderer: &R,
    url: &NormalizedUrl,
    max_issues: usize,
) -> Result<AccessibilityResult, CheckError> {
    let issues = renderer.scan_accessibility(url).await?;
    let result = summarize(issues, max_issues);
    debug!(
        "Accessibility: {} issues={} kept={}",
        url,
        result.issue_count,
        result.issues.len()
    );
    Ok(result)
}

/// Count all issues and keep the first `max_issues` in scan order.
pub fn summarize(mut issues: Vec<AccessibilityIssue>, max_issues: usize) -> AccessibilityResult {
    let issue_count = issues.len() as u64;
    issues.truncate(max_issues);
    AccessibilityResult {
        issue_count,
        issues,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AxeViolation {
    id: String,
    #[serde(default)]
    help: String,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    nodes: Vec<AxeNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AxeNode {
    #[serde(default)]
    target: Vec<serde_json::Value>,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    failure_summary: Option<String>,
    #[serde(default)]
    impact: Option<String>,
}

fn flatten(violations: Vec<AxeViolation>) -> Vec<AccessibilityIssue> {
    let mut issues = Vec::new();
    for violation in violations {
        for node in violation.nodes {
            let message = match node.failure_summary.as_deref().map(str::trim) {
                Some(summary) if !summary.is_empty() => {
                    format!("{}: {}", violation.help, summary)
                }
                _ => violation.help.clone(),
            };
            // Shadow-DOM targets are nested arrays; plain ones are strings
            let selector = node
                .target
                .iter()
                .map(|t| match t {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            issues.push(AccessibilityIssue {
                code: violation.id.clone(),
                message,
                impact: node.impact.or_else(|| violation.impact.clone()),
                selector: (!selector.is_empty()).then_some(selector),
                context: node.html,
            });
        }
    }
    issues
}

fn run_script() -> String {
    let tags = WCAG_TAGS
        .iter()
        .map(|t| format!("'{t}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "(async () => {{
  const results = await axe.run(document, {{ runOnly: {{ type: 'tag', values: [{tags}] }} }});
  return results.violations;
}})()"
    )
}

/// Inject axe into an already-loaded page and return its violations.
pub(crate) async fn scan_page(page: &Page, axe_source: &str) -> Result<Vec<AccessibilityIssue>, CheckError> {
    // Evaluating over CDP sidesteps the page's Content-Security-Policy
    evaluate::<serde_json::Value>(page, &format!("{axe_source}\n;true")).await?;
    let violations: Vec<AxeViolation> = evaluate(page, &run_script()).await?;
    Ok(flatten(violations))
}
