//! Agent configuration: one `clap::Parser` struct, every flag doubling as
//! an environment variable via `clap`'s `env` feature.

use std::path::PathBuf;

use clap::Parser;
use license_crypto::PublicKey;

/// Configuration for a single agent instance.
#[derive(Debug, Clone, Parser)]
#[command(name = "license-agent", about = "Client-side license lifecycle controller")]
pub struct AgentConfig {
    /// The license token. Missing means the agent starts `Invalid`.
    #[arg(long, env = "LICENSE_AGENT_CODE")]
    pub code: Option<String>,

    /// Base URL of the license authority.
    #[arg(long, env = "LICENSE_AGENT_SERVER_URL", default_value = "http://localhost:8100")]
    pub server_url: String,

    /// The authority's public key, as literal PEM text.
    #[arg(long, env = "LICENSE_AGENT_PUBLIC_KEY")]
    pub public_key: Option<String>,

    /// The authority's public key, as a path to a PEM file. Used if
    /// `public_key` is not set.
    #[arg(long, env = "LICENSE_AGENT_PUBLIC_KEY_PATH")]
    pub public_key_path: Option<PathBuf>,

    /// How often the heartbeat loop ticks.
    #[arg(long, env = "LICENSE_AGENT_HEARTBEAT_INTERVAL_SECONDS", default_value_t = 120)]
    pub heartbeat_interval_seconds: u64,

    /// How long the agent may run on cached state after going offline.
    #[arg(long, env = "LICENSE_AGENT_GRACE_PERIOD_HOURS", default_value_t = 72.0)]
    pub grace_period_hours: f64,

    /// Where the sealed offline cache is read from and written to.
    #[arg(long, env = "LICENSE_AGENT_CACHE_PATH", default_value = "./.license-cache")]
    pub cache_path: PathBuf,

    /// Paths the embedding application asks the agent not to enforce
    /// licensing under (e.g. local dev checkouts). Carried through for
    /// callers to consult; the lifecycle controller itself does not
    /// interpret these.
    #[arg(long, env = "LICENSE_AGENT_EXCLUDE_PATHS", value_delimiter = ',')]
    pub exclude_paths: Vec<PathBuf>,
}

impl AgentConfig {
    /// Loads the configured public key, preferring literal PEM text over a
    /// file path when both are set.
    pub fn load_public_key(&self) -> anyhow::Result<PublicKey> {
        if let Some(pem) = &self.public_key {
            return Ok(PublicKey::from_pem(pem)?);
        }
        if let Some(path) = &self.public_key_path {
            return Ok(PublicKey::from_path(path)?);
        }
        anyhow::bail!("either --public-key or --public-key-path must be set")
    }
}
