//! License authority binary: parses configuration, loads keys, starts the
//! HTTP server and the background sweep task.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use license_authority::config::Config;
use license_authority::{build_router, AppState, Engine};
use license_crypto::{PrivateKey, PublicKey};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();

    let public_key = PublicKey::from_path(&config.public_key_path)
        .with_context(|| format!("loading public key from {}", config.public_key_path.display()))?;
    let private_key = match &config.private_key_path {
        Some(path) => Some(
            PrivateKey::from_path(path)
                .with_context(|| format!("loading private key from {}", path.display()))?,
        ),
        None => None,
    };

    let engine = Engine::new(
        public_key,
        private_key,
        config.node_persist_path.clone(),
        config.license_persist_path.clone(),
        config.node_timeout_ms(),
    );

    let state = Arc::new(AppState {
        engine,
        admin_token: config.admin_token.clone(),
    });

    let sweep_state = state.clone();
    let sweep_interval = Duration::from_secs(config.sweep_interval_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_state.engine.sweep().await;
        }
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "license authority listening");
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
