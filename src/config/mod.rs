//! Configuration module for sitescope
//!
//! This module handles:
//! - User-level configuration (~/.config/sitescope/config.toml)
//! - Environment overrides (PORT, VOICE_SERVICE_URL, ...)
//! - Resolved runtime settings for the probes and the browser

mod user_config;

pub use user_config::{
    AuditSettings, BrowserSettings, UserConfig, DEFAULT_PORT, DEFAULT_UPSTREAM_URL,
};
