//! Authority configuration: CLI flags that double as environment variables
//! via `clap`'s `env` feature, following the `privstack-relay` binary's own
//! `#[derive(Parser)]` shape.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "license-authority")]
#[command(about = "License issuance and node registration authority")]
pub struct Config {
    /// Path to the RSA public key (PEM), used to verify registration tokens.
    #[arg(long, env = "LICENSE_AUTHORITY_PUBLIC_KEY_PATH")]
    pub public_key_path: PathBuf,

    /// Path to the RSA private key (PEM), used to mint new tokens. Optional
    /// for a verify-only deployment.
    #[arg(long, env = "LICENSE_AUTHORITY_PRIVATE_KEY_PATH")]
    pub private_key_path: Option<PathBuf>,

    /// Seconds of heartbeat silence before a node is considered stale.
    #[arg(long, env = "LICENSE_AUTHORITY_NODE_TIMEOUT_SECONDS", default_value_t = 300)]
    pub node_timeout_seconds: u64,

    /// Where the node registry snapshot is persisted.
    #[arg(
        long,
        env = "LICENSE_AUTHORITY_NODE_PERSIST_PATH",
        default_value = "./data/nodes.json"
    )]
    pub node_persist_path: PathBuf,

    /// Where the license-record registry snapshot is persisted.
    #[arg(
        long,
        env = "LICENSE_AUTHORITY_LICENSE_PERSIST_PATH",
        default_value = "./data/licenses.json"
    )]
    pub license_persist_path: PathBuf,

    /// Bearer token required on admin routes. Unset means "open", a
    /// local-dev convenience, never the default in a real deployment.
    #[arg(long, env = "LICENSE_AUTHORITY_ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    /// HTTP bind address.
    #[arg(long, env = "LICENSE_AUTHORITY_BIND_ADDR", default_value = "0.0.0.0:8100")]
    pub bind_addr: String,

    /// Sweep interval in seconds.
    #[arg(long, env = "LICENSE_AUTHORITY_SWEEP_INTERVAL_SECONDS", default_value_t = 60)]
    pub sweep_interval_seconds: u64,
}

impl Config {
    #[must_use]
    pub fn node_timeout_ms(&self) -> i64 {
        self.node_timeout_seconds as i64 * 1000
    }
}
