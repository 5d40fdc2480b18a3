//! The agent lifecycle state machine: startup, heartbeat loop, and
//! shutdown, bound together in an explicit handle rather than a global.
//!
//! Callers hold an `Arc<AgentHandle>`; nothing here reaches for a
//! process-wide singleton.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use license_crypto::PublicKey;
use license_types::TokenPayload;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::anti_tamper::AntiTamper;
use crate::config::AgentConfig;
use crate::fingerprint;
use crate::transport::{Outcome, Transport};

fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The three observable states the agent can be in. All three carry a
/// human-readable message; only `Invalid` blocks requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStatus {
    Invalid { message: String },
    ValidOnline { message: String },
    ValidDegraded { message: String },
}

impl AgentStatus {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid { .. })
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Invalid { message } | Self::ValidOnline { message } | Self::ValidDegraded { message } => message,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CachedState {
    payload: TokenPayload,
    #[serde(rename = "nodeId")]
    node_id: Option<String>,
    #[serde(rename = "lastVerifyTime")]
    last_verify_time: i64,
    #[serde(rename = "licenseCode")]
    license_code: String,
}

struct Inner {
    status: AgentStatus,
    node_id: Option<String>,
    payload: Option<TokenPayload>,
    anti_tamper: Option<AntiTamper>,
    failure_count: u32,
}

/// The live handle to a running agent. Construct with [`AgentHandle::start`]
/// and release with [`AgentHandle::shutdown`].
pub struct AgentHandle {
    inner: RwLock<Inner>,
    transport: Transport,
    public_key: PublicKey,
    cache_path: PathBuf,
    license_code: Option<String>,
    grace: Duration,
    heartbeat_interval: Duration,
    heartbeat_task: AsyncMutex<Option<JoinHandle<()>>>,
}

impl AgentHandle {
    /// Runs the startup sequence and, unless it lands on `Invalid`, starts
    /// the heartbeat loop.
    pub async fn start(config: AgentConfig) -> anyhow::Result<Arc<Self>> {
        let public_key = config.load_public_key()?;
        let transport = Transport::new(config.server_url.clone())?;

        let handle = Arc::new(Self {
            inner: RwLock::new(Inner {
                status: AgentStatus::Invalid {
                    message: "starting up".to_string(),
                },
                node_id: None,
                payload: None,
                anti_tamper: None,
                failure_count: 0,
            }),
            transport,
            public_key,
            cache_path: config.cache_path.clone(),
            license_code: config.code.clone(),
            grace: Duration::from_secs_f64(config.grace_period_hours * 3600.0),
            heartbeat_interval: Duration::from_secs(config.heartbeat_interval_seconds),
            heartbeat_task: AsyncMutex::new(None),
        });

        handle.bootstrap().await;

        if handle.status().await.is_valid() {
            handle.clone().spawn_heartbeat_loop().await;
        }

        Ok(handle)
    }

    #[must_use]
    pub async fn status(&self) -> AgentStatus {
        self.inner.read().await.status.clone()
    }

    #[must_use]
    pub async fn is_valid(&self) -> bool {
        self.inner.read().await.status.is_valid()
    }

    #[must_use]
    pub async fn node_id(&self) -> Option<String> {
        self.inner.read().await.node_id.clone()
    }

    /// Stops the heartbeat loop and best-effort unregisters. Safe to call
    /// even if startup never reached a valid state.
    pub async fn shutdown(&self) {
        if let Some(task) = self.heartbeat_task.lock().await.take() {
            task.abort();
        }
        let Some(node_id) = self.node_id().await else {
            return;
        };
        match self.transport.unregister(&node_id).await {
            Outcome::Success(_) => {}
            Outcome::Rejected { message, .. } => {
                debug!(message = %message, "unregister on shutdown was rejected");
            }
            Outcome::Transport(error) => {
                debug!(error = %error, "unregister on shutdown failed");
            }
        }
    }

    async fn bootstrap(&self) {
        let Some(code) = self.license_code.clone() else {
            self.set_status(AgentStatus::Invalid {
                message: "missing license code".to_string(),
            })
            .await;
            return;
        };

        let payload = match license_crypto::verify(&code, &self.public_key) {
            Ok(payload) => payload,
            Err(e) => {
                self.set_status(AgentStatus::Invalid {
                    message: format!("bad signature: {e}"),
                })
                .await;
                return;
            }
        };

        if self.try_register(&code).await {
            return;
        }

        if self.try_degrade_from_cache().await {
            return;
        }

        let now_wall = wall_clock_ms();
        if payload.is_expired_at(now_wall) {
            self.set_status(AgentStatus::Invalid {
                message: "token expired".to_string(),
            })
            .await;
            return;
        }

        let anti_tamper = AntiTamper::new(self.grace, now_wall, Instant::now());
        self.set_degraded(
            payload,
            None,
            anti_tamper,
            "no cached state, starting degraded on a freshly verified token".to_string(),
        )
        .await;
    }

    /// Attempts registration against the authority. On success this sets
    /// `ValidOnline` and writes the cache; on rejection it sets `Invalid`
    /// with the server's message; a transport failure leaves the current
    /// status untouched.
    async fn try_register(&self, code: &str) -> bool {
        let machine_info = fingerprint::collect();
        match self.transport.register(code, &machine_info).await {
            Outcome::Success(node_id) => match license_crypto::verify(code, &self.public_key) {
                Ok(payload) => {
                    let now_wall = wall_clock_ms();
                    let anti_tamper = AntiTamper::new(self.grace, now_wall, Instant::now());
                    self.write_cache(&payload, Some(&node_id), code, now_wall).await;
                    self.set_online(payload, node_id, anti_tamper, "registered".to_string())
                        .await;
                    true
                }
                Err(e) => {
                    self.set_status(AgentStatus::Invalid {
                        message: format!("bad signature after register: {e}"),
                    })
                    .await;
                    false
                }
            },
            Outcome::Rejected { message, .. } => {
                self.set_status(AgentStatus::Invalid { message }).await;
                false
            }
            Outcome::Transport(error) => {
                debug!(error = %error, "register call failed to reach the authority");
                false
            }
        }
    }

    async fn try_degrade_from_cache(&self) -> bool {
        let Some(cached) = self.read_cache() else {
            return false;
        };

        let now_wall = wall_clock_ms();
        if cached.payload.is_expired_at(now_wall) {
            self.set_status(AgentStatus::Invalid {
                message: "cached license expired".to_string(),
            })
            .await;
            return false;
        }

        let now_mono = Instant::now();
        let anti_tamper = AntiTamper::from_cached_wall_time(self.grace, cached.last_verify_time, now_mono);
        if !anti_tamper.is_degradation_valid(now_wall, now_mono) {
            self.set_status(AgentStatus::Invalid {
                message: "offline grace period exceeded".to_string(),
            })
            .await;
            return false;
        }

        let remaining = anti_tamper.remaining_grace_hours(now_mono);
        let message = format!("grace remaining {remaining:.1} hours");
        self.set_degraded(cached.payload, cached.node_id, anti_tamper, message).await;
        true
    }

    async fn spawn_heartbeat_loop(self: Arc<Self>) {
        let worker = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(worker.heartbeat_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                worker.heartbeat_tick().await;
            }
        });
        *self.heartbeat_task.lock().await = Some(task);
    }

    async fn heartbeat_tick(&self) {
        let Some(node_id) = self.node_id().await else {
            if let Some(code) = self.license_code.clone() {
                self.try_register(&code).await;
            }
            return;
        };

        match self.transport.heartbeat(&node_id).await {
            Outcome::Success(_) => self.on_heartbeat_success().await,
            Outcome::Rejected { code, .. } if code == 404 => {
                if let Some(license_code) = self.license_code.clone() {
                    self.try_register(&license_code).await;
                }
            }
            Outcome::Rejected { .. } | Outcome::Transport(_) => {
                self.on_heartbeat_failure().await;
            }
        }
    }

    async fn on_heartbeat_success(&self) {
        let now_wall = wall_clock_ms();
        let now_mono = Instant::now();

        let (was_degraded, payload, node_id) = {
            let mut inner = self.inner.write().await;
            inner.failure_count = 0;
            if let Some(at) = inner.anti_tamper.as_mut() {
                at.record_online_verify(now_wall, now_mono);
            }
            let was_degraded = matches!(inner.status, AgentStatus::ValidDegraded { .. });
            if was_degraded {
                inner.status = AgentStatus::ValidOnline {
                    message: "heartbeat succeeded".to_string(),
                };
            }
            (was_degraded, inner.payload.clone(), inner.node_id.clone())
        };

        if was_degraded {
            if let (Some(payload), Some(node_id), Some(code)) = (payload, node_id, self.license_code.clone()) {
                info!("heartbeat recovered after degradation, returning to online");
                self.write_cache(&payload, Some(&node_id), &code, now_wall).await;
            }
        }
    }

    async fn on_heartbeat_failure(&self) {
        let past_threshold = {
            let mut inner = self.inner.write().await;
            inner.failure_count += 1;
            inner.failure_count >= 3
        };
        if past_threshold {
            self.mark_offline_and_reassess().await;
        }
    }

    async fn mark_offline_and_reassess(&self) {
        let now_wall = wall_clock_ms();
        let now_mono = Instant::now();
        let mut inner = self.inner.write().await;

        let Some(at) = inner.anti_tamper.as_mut() else {
            inner.status = AgentStatus::Invalid {
                message: "offline with no prior online verification".to_string(),
            };
            return;
        };
        at.mark_offline(now_mono);

        if at.is_degradation_valid(now_wall, now_mono) {
            let remaining = at.remaining_grace_hours(now_mono);
            warn!(remaining_hours = remaining, "heartbeat failing, degrading to offline mode");
            inner.status = AgentStatus::ValidDegraded {
                message: format!("grace remaining {remaining:.1} hours"),
            };
        } else {
            warn!("offline grace period exceeded, invalidating");
            inner.status = AgentStatus::Invalid {
                message: "offline grace period exceeded".to_string(),
            };
        }
    }

    async fn set_status(&self, status: AgentStatus) {
        self.inner.write().await.status = status;
    }

    async fn set_online(&self, payload: TokenPayload, node_id: String, anti_tamper: AntiTamper, message: String) {
        let mut inner = self.inner.write().await;
        inner.status = AgentStatus::ValidOnline { message };
        inner.node_id = Some(node_id);
        inner.payload = Some(payload);
        inner.anti_tamper = Some(anti_tamper);
        inner.failure_count = 0;
    }

    async fn set_degraded(
        &self,
        payload: TokenPayload,
        node_id: Option<String>,
        anti_tamper: AntiTamper,
        message: String,
    ) {
        let mut inner = self.inner.write().await;
        inner.status = AgentStatus::ValidDegraded { message };
        inner.node_id = node_id;
        inner.payload = Some(payload);
        inner.anti_tamper = Some(anti_tamper);
    }

    fn read_cache(&self) -> Option<CachedState> {
        let blob = std::fs::read_to_string(&self.cache_path).ok()?;
        let bytes = license_crypto::cache_open(&blob, self.public_key.pem_text()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    async fn write_cache(&self, payload: &TokenPayload, node_id: Option<&str>, license_code: &str, now_wall: i64) {
        let cached = CachedState {
            payload: payload.clone(),
            node_id: node_id.map(str::to_string),
            last_verify_time: now_wall,
            license_code: license_code.to_string(),
        };
        let bytes = match serde_json::to_vec(&cached) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize cache state");
                return;
            }
        };
        let sealed = match license_crypto::cache_seal(&bytes, self.public_key.pem_text()) {
            Ok(sealed) => sealed,
            Err(e) => {
                tracing::error!(error = %e, "failed to seal cache blob");
                return;
            }
        };
        if let Err(e) = atomic_write(&self.cache_path, sealed.as_bytes()) {
            tracing::error!(error = %e, path = %self.cache_path.display(), "failed to persist cache file");
        }
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let tmp = path.with_extension("tmp");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(data)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}
