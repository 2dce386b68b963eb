//! Output reporters for audit results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON (same shape as the HTTP API)
//! - `pdf` - Printable A4 summary, the same document `/report.pdf` serves

mod json;
pub mod pdf;
mod text;

pub use text::render_breakdown;

use crate::models::Report;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Pdf,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, pdf",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Pdf => write!(f, "pdf"),
        }
    }
}

impl OutputFormat {
    /// Binary formats must go to a file, not the terminal
    pub fn is_binary(self) -> bool {
        matches!(self, OutputFormat::Pdf)
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Pdf => "pdf",
        }
    }
}

/// Render a report in the given format
pub fn render(report: &Report, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Text => text::render(report).map(String::into_bytes),
        OutputFormat::Json => json::render(report).map(String::into_bytes),
        OutputFormat::Pdf => pdf::render(report),
    }
}
