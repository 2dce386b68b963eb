//! Server command handler

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::audit::{Auditor, ReportStore};
use crate::checks::{ChromeRenderer, HttpFetcher};
use crate::config::UserConfig;
use crate::relay::TungsteniteConnector;
use crate::server::{self, AppState};

/// Run the HTTP server until Ctrl-C
pub fn run(host: Option<String>, port: Option<u16>, upstream_url: Option<String>) -> Result<()> {
    let mut config = UserConfig::load()?;
    if host.is_some() {
        config.server.host = host;
    }
    if port.is_some() {
        config.server.port = port;
    }
    if upstream_url.is_some() {
        config.relay.upstream_url = upstream_url;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(serve(config))
}

async fn serve(config: UserConfig) -> Result<()> {
    let audit = config.audit_settings();
    let fetcher = HttpFetcher::new(&audit).context("Failed to build HTTP client")?;
    let renderer = ChromeRenderer::new(config.browser_settings(), audit.clone())
        .context("Failed to build HTTP client")?;
    let auditor = Auditor::new(fetcher, renderer, audit, ReportStore::new());

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        auditor,
        TungsteniteConnector::new(config.upstream_url()),
        shutdown.clone(),
    );
    info!("Relaying voice commands to {}", config.upstream_url());

    let addr = (config.host(), config.port());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host(), config.port()))?;

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Could not listen for Ctrl-C: {}", e);
            return;
        }
        info!("Shutting down");
        shutdown.cancel();
    });

    server::serve(listener, state).await?;
    Ok(())
}
