use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for hostq
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Worker pool and cache configuration
    #[serde(default)]
    pub pool: PoolConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Number of resolver worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Time-to-live for cached answers, in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Lower bound applied when the TTL is (re)configured, in seconds
    #[serde(default = "default_ttl_floor")]
    pub ttl_floor_secs: u64,

    /// Upper bound applied when the TTL is (re)configured, in seconds
    #[serde(default = "default_ttl_ceiling")]
    pub ttl_ceiling_secs: u64,

    /// How often the cache pruner wakes to consider a scan, in milliseconds
    #[serde(default = "default_prune_tick")]
    pub prune_tick_ms: u64,

    /// Bounded wait used by workers polling the request queue, in milliseconds
    #[serde(default = "default_queue_poll")]
    pub queue_poll_ms: u64,
}

impl PoolConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn ttl_floor(&self) -> Duration {
        Duration::from_secs(self.ttl_floor_secs)
    }

    pub fn ttl_ceiling(&self) -> Duration {
        Duration::from_secs(self.ttl_ceiling_secs)
    }

    pub fn prune_tick(&self) -> Duration {
        Duration::from_millis(self.prune_tick_ms)
    }

    pub fn queue_poll(&self) -> Duration {
        Duration::from_millis(self.queue_poll_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            cache_ttl_secs: default_cache_ttl(),
            ttl_floor_secs: default_ttl_floor(),
            ttl_ceiling_secs: default_ttl_ceiling(),
            prune_tick_ms: default_prune_tick(),
            queue_poll_ms: default_queue_poll(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_workers() -> usize {
    15
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_ttl_floor() -> u64 {
    1
}

fn default_ttl_ceiling() -> u64 {
    86_400
}

fn default_prune_tick() -> u64 {
    2_000
}

fn default_queue_poll() -> u64 {
    2_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. hostq.toml in current directory
    /// 3. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("hostq.toml").exists() {
            Self::from_file("hostq.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(workers) = overrides.workers {
            self.pool.workers = workers;
        }
        if let Some(ttl) = overrides.cache_ttl_secs {
            self.pool.cache_ttl_secs = ttl;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.workers == 0 {
            return Err(ConfigError::Validation(
                "Worker count cannot be 0".to_string(),
            ));
        }
        if self.pool.ttl_floor_secs > self.pool.ttl_ceiling_secs {
            return Err(ConfigError::Validation(format!(
                "TTL floor ({}s) exceeds ceiling ({}s)",
                self.pool.ttl_floor_secs, self.pool.ttl_ceiling_secs
            )));
        }
        if self.pool.queue_poll_ms == 0 {
            return Err(ConfigError::Validation(
                "Queue poll interval cannot be 0".to_string(),
            ));
        }
        if self.pool.prune_tick_ms == 0 {
            return Err(ConfigError::Validation(
                "Prune tick cannot be 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub workers: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(String, String),

    #[error("Failed to write config file {0}: {1}")]
    FileWrite(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
