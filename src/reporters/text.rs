//! Text (terminal) reporter with colors and formatting

use crate::models::Report;
use crate::scoring::ScoreBreakdown;
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Accessibility issues listed before "...and N more"
const ISSUES_SHOWN: usize = 10;

fn score_color(score: u8) -> &'static str {
    if score >= 80 {
        GREEN
    } else if score >= 60 {
        YELLOW
    } else {
        RED
    }
}

fn mark(ok: bool) -> String {
    if ok {
        format!("{GREEN}ok{RESET}")
    } else {
        format!("{RED}!!{RESET}")
    }
}

/// Render report as formatted terminal output
pub fn render(report: &Report) -> Result<String> {
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{BOLD}Website Audit{RESET}  {}\n", report.url));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Score: {}{BOLD}{}/100{RESET}\n\n",
        score_color(report.score),
        report.score
    ));

    // Security
    let sec = &report.security;
    out.push_str(&format!("{BOLD}SECURITY{RESET}\n"));
    out.push_str(&format!(
        "  [{}] HTTPS\n",
        mark(sec.uses_secure_transport)
    ));
    for header in &sec.present_headers {
        out.push_str(&format!("  [{}] {}\n", mark(true), header));
    }
    for header in &sec.missing_headers {
        out.push_str(&format!("  [{}] {} {DIM}(missing){RESET}\n", mark(false), header));
    }
    out.push('\n');

    // Performance
    let perf = &report.performance;
    out.push_str(&format!("{BOLD}PERFORMANCE{RESET}\n"));
    out.push_str(&format!(
        "  Load time: {} ms  Resources: {}  Transfer: {}  DOM nodes: {}\n\n",
        perf.load_time_ms,
        perf.resource_count,
        format_bytes(perf.total_transfer_bytes),
        perf.dom_node_count
    ));

    // SEO
    let seo = &report.seo;
    out.push_str(&format!("{BOLD}SEO{RESET}\n"));
    out.push_str(&format!("  Title: {}\n", or_none(&seo.title)));
    out.push_str(&format!(
        "  Meta description: {}\n",
        or_none(&seo.meta_description)
    ));
    out.push_str(&format!(
        "  H1 headings: {}  Images without alt: {}\n\n",
        seo.h1_count, seo.images_missing_alt
    ));

    // Accessibility
    let a11y = &report.accessibility;
    out.push_str(&format!(
        "{BOLD}ACCESSIBILITY{RESET} ({} issues)\n",
        a11y.issue_count
    ));
    for issue in a11y.issues.iter().take(ISSUES_SHOWN) {
        // chars() keeps truncation on a UTF-8 boundary
        let message: String = issue.message.lines().next().unwrap_or_default().chars().take(70).collect();
        out.push_str(&format!("  {YELLOW}{:<24}{RESET} {}\n", issue.code, message));
        if let Some(selector) = &issue.selector {
            out.push_str(&format!("  {DIM}{:<24} {}{RESET}\n", "", selector));
        }
    }
    let remaining = (a11y.issue_count as usize).saturating_sub(ISSUES_SHOWN.min(a11y.issues.len()));
    if remaining > 0 {
        out.push_str(&format!(
            "\n  {DIM}...and {} more (use --format json for the full list){RESET}\n",
            remaining
        ));
    }

    Ok(out)
}

/// Render the score deductions, one per line
pub fn render_breakdown(breakdown: &ScoreBreakdown) -> String {
    let mut out = format!("{BOLD}SCORE BREAKDOWN{RESET}\n  {:>6}  start\n", "100.0");
    for deduction in &breakdown.deductions {
        out.push_str(&format!(
            "  {RED}{:>6.1}{RESET}  {}\n",
            -deduction.points, deduction.reason
        ));
    }
    out.push_str(&format!(
        "  {DIM}──────{RESET}\n  {BOLD}{:>6}{RESET}  final (raw {:.1})\n",
        breakdown.score, breakdown.raw_score
    ));
    out
}

fn or_none(value: &str) -> String {
    if value.is_empty() {
        format!("{RED}(none){RESET}")
    } else {
        value.to_string()
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} B", bytes)
    }
}
