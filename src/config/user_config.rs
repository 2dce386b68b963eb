//! User-level configuration for sitescope
//!
//! Supports loading config from:
//! - ~/.config/sitescope/config.toml
//! - Environment variables (override the file)
//!
//! CLI flags are applied on top by the command handlers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPSTREAM_URL: &str = "ws://localhost:8765";
pub const DEFAULT_ACCESSIBILITY_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_ACCESSIBILITY_ISSUES: usize = 250;
pub const DEFAULT_AXE_SCRIPT_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/axe-core/4.10.2/axe.min.js";
pub const DEFAULT_IDLE_MAX_INFLIGHT: usize = 2;
pub const DEFAULT_IDLE_WINDOW_MS: u64 = 500;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Interface to bind (default: 0.0.0.0)
    pub host: Option<String>,
    /// Listen port (default: 5000)
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Voice service WebSocket address (default: ws://localhost:8765)
    pub upstream_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuditConfig {
    pub user_agent: Option<String>,
    /// Timeout for the security/SEO fetches. Unset means no timeout.
    pub request_timeout_secs: Option<u64>,
    pub accessibility_timeout_secs: Option<u64>,
    pub max_accessibility_issues: Option<usize>,
    /// URL or local path of the axe-core bundle
    pub axe_script_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BrowserConfig {
    /// Chrome/Chromium binary (default: auto-detect)
    pub executable: Option<PathBuf>,
    /// Network is quiet when at most this many requests are in flight...
    pub idle_max_inflight: Option<usize>,
    /// ...for this long
    pub idle_window_ms: Option<u64>,
}

/// Resolved settings for the HTTP probes and the aggregator.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub user_agent: String,
    pub request_timeout: Option<Duration>,
    pub accessibility_timeout: Duration,
    pub max_accessibility_issues: usize,
    pub axe_script_url: String,
}

impl Default for AuditSettings {
    fn default() -> Self {
        UserConfig::default().audit_settings()
    }
}

/// Resolved settings for launching headless browsers.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,
    pub idle_max_inflight: usize,
    pub idle_window: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        UserConfig::default().browser_settings()
    }
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/sitescope/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            match std::fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|content| Ok(toml::from_str::<UserConfig>(&content)?))
            {
                Ok(user_config) => config.merge(user_config),
                Err(e) => tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e),
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sitescope").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if other.server.host.is_some() {
            self.server.host = other.server.host;
        }
        if other.server.port.is_some() {
            self.server.port = other.server.port;
        }
        if other.relay.upstream_url.is_some() {
            self.relay.upstream_url = other.relay.upstream_url;
        }
        if other.audit.user_agent.is_some() {
            self.audit.user_agent = other.audit.user_agent;
        }
        if other.audit.request_timeout_secs.is_some() {
            self.audit.request_timeout_secs = other.audit.request_timeout_secs;
        }
        if other.audit.accessibility_timeout_secs.is_some() {
            self.audit.accessibility_timeout_secs = other.audit.accessibility_timeout_secs;
        }
        if other.audit.max_accessibility_issues.is_some() {
            self.audit.max_accessibility_issues = other.audit.max_accessibility_issues;
        }
        if other.audit.axe_script_url.is_some() {
            self.audit.axe_script_url = other.audit.axe_script_url;
        }
        if other.browser.executable.is_some() {
            self.browser.executable = other.browser.executable;
        }
        if other.browser.idle_max_inflight.is_some() {
            self.browser.idle_max_inflight = other.browser.idle_max_inflight;
        }
        if other.browser.idle_window_ms.is_some() {
            self.browser.idle_window_ms = other.browser.idle_window_ms;
        }
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("HOST").filter(|h| !h.is_empty()) {
            self.server.host = Some(host);
        }
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = Some(port),
                Err(_) => tracing::warn!("Ignoring invalid PORT value '{}'", port),
            }
        }
        if let Some(url) = lookup("VOICE_SERVICE_URL").filter(|u| !u.is_empty()) {
            self.relay.upstream_url = Some(url);
        }
        if let Some(exe) = lookup("CHROME_EXECUTABLE").filter(|e| !e.is_empty()) {
            self.browser.executable = Some(PathBuf::from(exe));
        }
        if let Some(axe) = lookup("SITESCOPE_AXE_URL").filter(|a| !a.is_empty()) {
            self.audit.axe_script_url = Some(axe);
        }
    }

    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn upstream_url(&self) -> &str {
        self.relay.upstream_url.as_deref().unwrap_or(DEFAULT_UPSTREAM_URL)
    }

    pub fn audit_settings(&self) -> AuditSettings {
        AuditSettings {
            user_agent: self
                .audit
                .user_agent
                .clone()
                .unwrap_or_else(|| format!("sitescope/{}", env!("CARGO_PKG_VERSION"))),
            request_timeout: self.audit.request_timeout_secs.map(Duration::from_secs),
            accessibility_timeout: Duration::from_secs(
                self.audit
                    .accessibility_timeout_secs
                    .unwrap_or(DEFAULT_ACCESSIBILITY_TIMEOUT_SECS),
            ),
            max_accessibility_issues: self
                .audit
                .max_accessibility_issues
                .unwrap_or(DEFAULT_MAX_ACCESSIBILITY_ISSUES),
            axe_script_url: self
                .audit
                .axe_script_url
                .clone()
                .unwrap_or_else(|| DEFAULT_AXE_SCRIPT_URL.to_string()),
        }
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            executable: self.browser.executable.clone(),
            idle_max_inflight: self
                .browser
                .idle_max_inflight
                .unwrap_or(DEFAULT_IDLE_MAX_INFLIGHT),
            idle_window: Duration::from_millis(
                self.browser.idle_window_ms.unwrap_or(DEFAULT_IDLE_WINDOW_MS),
            ),
        }
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, EXAMPLE_CONFIG)?;
        }

        Ok(config_path)
    }
}

const EXAMPLE_CONFIG: &str = r#"# sitescope configuration
# Environment variables (PORT, HOST, VOICE_SERVICE_URL, CHROME_EXECUTABLE,
# SITESCOPE_AXE_URL) override values set here.

[server]
# host = "0.0.0.0"
# port = 5000

[relay]
# Voice-command service the WebSocket relay connects to
# upstream_url = "ws://localhost:8765"

[audit]
# user_agent = "sitescope"
# Timeout for the security/SEO fetches (unset = wait forever)
# request_timeout_secs = 30
# accessibility_timeout_secs = 60
# max_accessibility_issues = 250
# axe_script_url = "https://cdnjs.cloudflare.com/ajax/libs/axe-core/4.10.2/axe.min.js"

[browser]
# executable = "/usr/bin/chromium"
# idle_max_inflight = 2
# idle_window_ms = 500
"#;
