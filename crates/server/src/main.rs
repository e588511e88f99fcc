//! shelter server entry point.
//!
//! Loads configuration, boots the offline worker (install, then activate) and
//! serves intercepted fetches over MCP on stdio. Logging goes to stderr to
//! avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shelter_client::{FetchConfig, HttpNetwork, Network};
use shelter_core::{AppConfig, CacheDb};
use shelter_worker::{EventHost, OfflineWorker, WorkerConfig};
use tracing_subscriber::EnvFilter;
use url::Url;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = Url::parse(&config.origin).with_context(|| format!("invalid origin {}", config.origin))?;

    let cache = CacheDb::open(&config.db_path)
        .await?
        .with_vary_headers(config.vary_headers.clone());
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(FetchConfig::from_app(&config)?)?);

    let worker_config = WorkerConfig::from(&config);
    let worker = Arc::new(OfflineWorker::new(worker_config, origin.clone(), cache.clone(), network.clone()));
    let mut host = EventHost::new(network);
    worker.register(&mut host);

    // The MCP client is the page this worker controls.
    host.connect_client();

    if let Err(e) = host.start().await {
        let state = host.state().await;
        tracing::error!(error = %e, state = %state, "worker did not activate; requests pass through");
    }

    tracing::info!(origin = %origin, cache = %config.cache_name, "Starting shelter server on stdio transport");

    let handler = handler::ShelterServer::new(Arc::new(host), cache, origin);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
