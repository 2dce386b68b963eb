//! One-shot audit command

use anyhow::{bail, Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::audit::{Auditor, ReportStore};
use crate::checks::{ChromeRenderer, HttpFetcher};
use crate::config::UserConfig;
use crate::reporters::{self, OutputFormat};

/// Audit `url` and write the report to stdout or `output`
pub fn run(url: &str, format: &str, output: Option<&Path>, explain_score: bool) -> Result<()> {
    let format = OutputFormat::from_str(format)?;
    if format.is_binary() && output.is_none() {
        bail!(
            "{} output is binary; pass --output <FILE>.{}",
            format,
            format.file_extension()
        );
    }

    let config = UserConfig::load()?;
    let audit = config.audit_settings();
    let fetcher = HttpFetcher::new(&audit).context("Failed to build HTTP client")?;
    let renderer = ChromeRenderer::new(config.browser_settings(), audit.clone())
        .context("Failed to build HTTP client")?;
    let auditor = Auditor::new(fetcher, renderer, audit, ReportStore::new());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(create_spinner_style());
    spinner.set_message(format!("Auditing {}...", url));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(auditor.audit_explained(url));
    spinner.finish_and_clear();
    let (report, breakdown) = outcome?;

    let rendered = reporters::render(&report, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Report written to {} (score {})",
                style("✓").green().bold(),
                style(path.display()).cyan(),
                style(report.score).bold()
            );
        }
        None => {
            std::io::stdout().write_all(&rendered)?;
        }
    }

    if explain_score {
        eprintln!("\n{}", reporters::render_breakdown(&breakdown));
    }
    Ok(())
}

fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
