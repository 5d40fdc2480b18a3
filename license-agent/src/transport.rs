//! HTTP transport to the authority: register, heartbeat, unregister.
//!
//! The controller never inspects a raw [`reqwest::Error`], every call
//! collapses into [`Outcome`], so a timeout, a connection refusal, and a DNS
//! failure are all just "transport failed, try again later" from the
//! controller's point of view.

use std::time::Duration;

use license_types::{ApiEnvelope, MachineInfo};
use serde::{Deserialize, Serialize};

const TIMEOUT: Duration = Duration::from_secs(5);

/// The outcome of a single RPC to the authority.
pub enum Outcome<T> {
    /// `code == 200`, envelope data present.
    Success(T),
    /// Non-200 envelope response.
    Rejected { code: u16, message: String },
    /// The request never produced an envelope at all.
    Transport(String),
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    #[serde(rename = "licenseCode")]
    license_code: &'a str,
    #[serde(rename = "machineInfo")]
    machine_info: &'a MachineInfo,
}

#[derive(Serialize)]
struct NodeIdBody<'a> {
    #[serde(rename = "nodeId")]
    node_id: &'a str,
}

/// A thin client binding one authority base URL.
pub struct Transport {
    client: reqwest::Client,
    base_url: String,
}

impl Transport {
    /// Builds a transport with ~5s connect and read timeouts.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(TIMEOUT)
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub async fn register(&self, license_code: &str, machine_info: &MachineInfo) -> Outcome<String> {
        let body = RegisterBody {
            license_code,
            machine_info,
        };
        self.post_envelope("/api/node/register", &body).await
    }

    pub async fn heartbeat(&self, node_id: &str) -> Outcome<bool> {
        let body = NodeIdBody { node_id };
        self.post_envelope("/api/node/heartbeat", &body).await
    }

    pub async fn unregister(&self, node_id: &str) -> Outcome<bool> {
        let body = NodeIdBody { node_id };
        self.post_envelope("/api/node/unregister", &body).await
    }

    async fn post_envelope<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Outcome<T> {
        let resp = match self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return Outcome::Transport(e.to_string()),
        };

        let status = resp.status();
        let envelope: ApiEnvelope<T> = match resp.json().await {
            Ok(envelope) => envelope,
            Err(e) => return Outcome::Transport(e.to_string()),
        };

        if status.is_success() && envelope.code == 200 {
            match envelope.data {
                Some(data) => Outcome::Success(data),
                None => Outcome::Rejected {
                    code: envelope.code,
                    message: "success envelope carried no data".to_string(),
                },
            }
        } else {
            Outcome::Rejected {
                code: envelope.code,
                message: envelope.message,
            }
        }
    }
}
