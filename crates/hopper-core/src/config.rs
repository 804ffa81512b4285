use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

// Pipeline constants — fixed by the wire/behavior contract, not configurable
pub const STATS_INTERVAL_SECS: u64 = 1; // queueStats emission cadence
pub const STORE_RETRY_BACKOFF_SECS: u64 = 1; // wait after a failed store call before retrying
pub const SNAPSHOT_PREVIEW_LEN: usize = 5; // undelivered messages shown per snapshot
pub const PROGRESS_LOG_EVERY: u64 = 1000; // worker progress log cadence
pub const DEFAULT_QUEUE_KEY: &str = "message_queue";
pub const HELLO_CACHE_KEY: &str = "hello";
pub const HELLO_CACHE_TTL_SECS: u64 = 60;

/// Top-level config (hopper.toml + HOPPER_* env overrides).
///
/// Env vars use `__` as the section separator, e.g.
/// `HOPPER_QUEUE__HOST=redis.internal` or `HOPPER_PIPELINE__WORKERS=4`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HopperConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Which queue store implementation backs the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// Durable Redis list — the production backend; survives restarts and
    /// is safe under multiple processes.
    Redis,
    /// Process-local in-memory queue for tests and standalone demos.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_backend")]
    pub backend: QueueBackend,
    /// Redis host; ignored by the memory backend.
    #[serde(default = "default_queue_host")]
    pub host: String,
    #[serde(default = "default_queue_port")]
    pub port: u16,
    /// Logical Redis database index.
    #[serde(default)]
    pub db: i64,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Name of the backing list.
    #[serde(default = "default_queue_key")]
    pub key: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            host: default_queue_host(),
            port: default_queue_port(),
            db: 0,
            username: None,
            password: None,
            key: default_queue_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProducerConfig {
    /// Pause between enqueues in milliseconds; 0 produces flat out.
    #[serde(default)]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent consumer workers while the pipeline is active.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Blocking-dequeue timeout per poll, in seconds. 0 waits indefinitely,
    /// which makes worker shutdown wait for the next enqueue — keep this
    /// short for responsive deactivation.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// When true, a worker that hits an undecodable entry exits permanently
    /// instead of dropping the entry and continuing.
    #[serde(default)]
    pub stop_on_error: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            poll_timeout_secs: default_poll_timeout(),
            stop_on_error: false,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_backend() -> QueueBackend {
    QueueBackend::Redis
}
fn default_queue_host() -> String {
    "localhost".to_string()
}
fn default_queue_port() -> u16 {
    6379
}
fn default_queue_key() -> String {
    DEFAULT_QUEUE_KEY.to_string()
}
fn default_workers() -> usize {
    1
}
fn default_poll_timeout() -> u64 {
    1
}

impl HopperConfig {
    /// Load config from a TOML file with HOPPER_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./hopper.toml
    /// A missing file is not an error — defaults plus env cover it.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("hopper.toml");

        let config: HopperConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("HOPPER_").split("__"))
            .extract()
            .map_err(|e| crate::error::HopperError::Config(e.to_string()))?;

        Ok(config)
    }
}
