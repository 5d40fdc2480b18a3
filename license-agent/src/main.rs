//! Demo binary: starts an agent against a running authority, logs status
//! transitions, and shuts down cleanly on Ctrl-C.

use anyhow::Result;
use clap::Parser;
use license_agent::{AgentConfig, AgentHandle};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AgentConfig::parse();
    let agent = AgentHandle::start(config).await?;

    let status = agent.status().await;
    info!(valid = status.is_valid(), message = status.message(), "agent started");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    agent.shutdown().await;

    Ok(())
}
