//! Configuration schema definitions
//!
//! One section per cluster role, each with serde defaults so a partial file
//! (or no file at all) yields a runnable single-host setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default master port
pub const DEFAULT_MASTER_PORT: u16 = 12345;
/// Default worker command port
pub const DEFAULT_WORKER_PORT: u16 = 20000;
/// Default reducer port
pub const DEFAULT_REDUCER_PORT: u16 = 23456;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub master: MasterConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub reducer: ReducerConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Master server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Listen address
    #[serde(default = "default_master_bind")]
    pub bind: String,

    /// Credential store (JSON map of user to password digest)
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    /// How long a client request waits for the first worker to register
    #[serde(default = "default_worker_wait_secs")]
    pub worker_wait_secs: u64,

    /// How long a reduce command waits for the reducer's result
    #[serde(default = "default_reduce_timeout_secs")]
    pub reduce_timeout_secs: u64,

    /// Timeout for a single master to worker exchange
    #[serde(default = "default_io_timeout_secs")]
    pub worker_io_timeout_secs: u64,

    /// Reject client commands that do not carry a session token
    #[serde(default)]
    pub require_login: bool,

    /// Idle time after which a session token stops working
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl MasterConfig {
    pub fn worker_wait(&self) -> Duration {
        Duration::from_secs(self.worker_wait_secs)
    }

    pub fn reduce_timeout(&self) -> Duration {
        Duration::from_secs(self.reduce_timeout_secs)
    }

    pub fn worker_io_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_io_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            bind: default_master_bind(),
            credentials_path: default_credentials_path(),
            worker_wait_secs: default_worker_wait_secs(),
            reduce_timeout_secs: default_reduce_timeout_secs(),
            worker_io_timeout_secs: default_io_timeout_secs(),
            require_login: false,
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_master_bind() -> String {
    format!("0.0.0.0:{}", DEFAULT_MASTER_PORT)
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_worker_wait_secs() -> u64 {
    30
}

fn default_reduce_timeout_secs() -> u64 {
    30
}

fn default_io_timeout_secs() -> u64 {
    10
}

fn default_session_ttl_secs() -> u64 {
    8 * 60 * 60
}

/// Worker node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Command listener address
    #[serde(default = "default_worker_bind")]
    pub bind: String,

    /// Master address used for the handshake and shutdown notice
    #[serde(default = "default_master_addr")]
    pub master_addr: String,

    /// Reducer address that receives mapping output
    #[serde(default = "default_reducer_addr")]
    pub reducer_addr: String,

    /// Directory of store JSON files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Handshake attempts before falling back to standalone mode
    #[serde(default = "default_handshake_attempts")]
    pub handshake_attempts: u32,

    /// Timeout for calls to the master and the reducer
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

impl WorkerConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            bind: default_worker_bind(),
            master_addr: default_master_addr(),
            reducer_addr: default_reducer_addr(),
            data_dir: default_data_dir(),
            handshake_attempts: default_handshake_attempts(),
            io_timeout_secs: default_io_timeout_secs(),
        }
    }
}

fn default_worker_bind() -> String {
    format!("0.0.0.0:{}", DEFAULT_WORKER_PORT)
}

fn default_master_addr() -> String {
    format!("127.0.0.1:{}", DEFAULT_MASTER_PORT)
}

fn default_reducer_addr() -> String {
    format!("127.0.0.1:{}", DEFAULT_REDUCER_PORT)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/stores")
}

fn default_handshake_attempts() -> u32 {
    5
}

/// Reduce server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReducerConfig {
    /// Listen address
    #[serde(default = "default_reducer_bind")]
    pub bind: String,

    /// Master address that receives reduced results
    #[serde(default = "default_master_addr")]
    pub master_addr: String,

    /// Jobs still incomplete after this many seconds are dropped
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,

    /// Timeout for delivering a result to the master
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

impl ReducerConfig {
    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            bind: default_reducer_bind(),
            master_addr: default_master_addr(),
            job_ttl_secs: default_job_ttl_secs(),
            io_timeout_secs: default_io_timeout_secs(),
        }
    }
}

fn default_reducer_bind() -> String {
    format!("0.0.0.0:{}", DEFAULT_REDUCER_PORT)
}

fn default_job_ttl_secs() -> u64 {
    120
}

/// Console client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Master address
    #[serde(default = "default_master_addr")]
    pub master_addr: String,

    /// Customer latitude
    #[serde(default)]
    pub latitude: f64,

    /// Customer longitude
    #[serde(default)]
    pub longitude: f64,

    /// Search radius in kilometers
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,

    /// Request timeout in seconds
    #[serde(default = "default_client_timeout_secs")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            master_addr: default_master_addr(),
            latitude: 0.0,
            longitude: 0.0,
            radius_km: default_radius_km(),
            timeout_secs: default_client_timeout_secs(),
        }
    }
}

fn default_radius_km() -> f64 {
    5.0
}

fn default_client_timeout_secs() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional directory for a daily rolling log file
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Emit JSON lines instead of the compact format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
