//! sitescope - concurrent website auditor
//!
//! Audits a URL along four independent dimensions (transport security,
//! on-page SEO, load performance, WCAG accessibility), folds them into a
//! 0-100 score and serves the latest report over HTTP and as a PDF. The
//! same server relays WebSocket voice commands to a speech service.

pub mod audit;
pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod relay;
pub mod reporters;
pub mod scoring;
pub mod server;
