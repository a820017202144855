//! Configuration management for AgentHub
//!
//! Loads and saves worker, runtime and provider settings from a JSON file
//! under the data directory. Every field has a default, so a missing or
//! partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir, store_path};

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config not found: {0}")]
    NotFound(PathBuf),

    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<String>),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Anthropic provider credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.anthropic.com/v1".to_string()
}

/// All model providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

/// Conversation loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_iterations: default_max_iterations(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_iterations() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Queue worker parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_claim_batch_size")]
    pub claim_batch_size: usize,
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Overrides the host:pid worker identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            claim_batch_size: default_claim_batch_size(),
            lock_ttl_secs: default_lock_ttl_secs(),
            max_attempts: default_max_attempts(),
            worker_id: None,
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_claim_batch_size() -> usize {
    5
}

fn default_lock_ttl_secs() -> u64 {
    10 * 60
}

fn default_max_attempts() -> u32 {
    3
}

/// Persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// SQLite database path; defaults to ~/.agenthub/agenthub.db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Anthropic API key, falling back to the environment
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(
            &self.provider.anthropic.api_key,
            std::env::var(API_KEY_ENV).ok(),
        )
    }

    pub fn api_base(&self) -> String {
        self.provider.anthropic.api_base.clone()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// SQLite database path
    pub fn store_path(&self) -> PathBuf {
        match &self.store.path {
            Some(path) => expand_home(path),
            None => store_path(),
        }
    }

    /// Check the settings a worker cannot run without
    pub fn validate_worker_ready(&self) -> Result<()> {
        let mut missing = Vec::new();

        if !self.has_api_key() {
            missing.push(API_KEY_ENV.to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }
}

fn resolve_api_key(configured: &str, from_env: Option<String>) -> Option<String> {
    if !configured.is_empty() {
        return Some(configured.to_string());
    }
    from_env.filter(|key| !key.trim().is_empty())
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Write a default config (if absent) and create the data directory
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("config already exists at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("config written to {:?}", config_path);
    }

    tokio::fs::create_dir_all(data_dir()).await?;

    Config::load().await
}
