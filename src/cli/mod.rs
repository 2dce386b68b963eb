//! CLI command definitions and handlers

mod audit;
mod config;
mod serve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sitescope - website auditor and voice-command relay
#[derive(Parser, Debug)]
#[command(name = "sitescope")]
#[command(
    version,
    about = "Audit a website for security, SEO, performance and accessibility",
    long_about = "sitescope runs four independent checks against a URL (security headers, \
on-page SEO, load performance in headless Chrome and a WCAG 2 AA scan), combines them \
into a 0-100 score and serves the result over HTTP. The server also relays WebSocket \
voice commands to a speech service.\n\n\
Run without a subcommand to start the server:\n  \
sitescope",
    after_help = "\
Examples:
  sitescope                                   Start the server on port 5000
  sitescope serve --port 8080                 Start the server on another port
  sitescope audit example.com                 One-shot audit in the terminal
  sitescope audit example.com --format json   JSON output for scripting
  sitescope audit example.com -f pdf -o r.pdf Save a PDF report
  sitescope config init                       Write an example config file"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API and WebSocket relay (default)
    Serve {
        /// Address to bind (overrides HOST and the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides PORT and the config file)
        #[arg(long, short = 'p')]
        port: Option<u16>,

        /// Voice service the relay connects to (overrides VOICE_SERVICE_URL)
        #[arg(long)]
        upstream_url: Option<String>,
    },

    /// Audit a single URL and print the report
    #[command(after_help = "\
Examples:
  sitescope audit example.com
  sitescope audit https://example.com --explain-score
  sitescope audit example.com --format json -o report.json
  sitescope audit example.com --format pdf -o report.pdf")]
    Audit {
        /// URL to audit (https:// is assumed when no scheme is given)
        url: String,

        /// Output format: text, json, pdf
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "pdf"])]
        format: String,

        /// Output file path (required for pdf)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Show every score deduction
        #[arg(long)]
        explain_score: bool,
    },

    /// Manage user configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize config file with example settings
    Init,
    /// Show effective settings and config path
    Show,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        None => serve::run(None, None, None),
        Some(Commands::Serve {
            host,
            port,
            upstream_url,
        }) => serve::run(host, port, upstream_url),
        Some(Commands::Audit {
            url,
            format,
            output,
            explain_score,
        }) => audit::run(&url, &format, output.as_deref(), explain_score),
        Some(Commands::Config { action }) => config::run(action),
    }
}
