//! Agent configuration.
//!
//! Loaded from a YAML file (default location: /etc/swagent/swagent.yaml) with
//! every field optional, then overridden from the command line.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use log::info;
use serde::Deserialize;

use crate::cosq::QueueSettings;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/swagent/swagent.yaml";

/// Counter collection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatsConfig {
    /// Interval between two collection passes in milliseconds
    #[serde(default = "default_stats_interval")]
    pub interval_ms: u64,
}

/// Packet transmit settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxConfig {
    /// Upper bound on a synchronous send in milliseconds; unset waits forever
    #[serde(default)]
    pub sync_send_timeout_ms: Option<u64>,
}

/// Simulated switch used when no hardware is attached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub unit: u32,

    #[serde(default = "default_cos_supported")]
    pub cos_supported: bool,

    #[serde(default = "default_cpu_queues")]
    pub cpu_queues: u8,
}

/// Complete agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub stats: StatsConfig,

    #[serde(default)]
    pub tx: TxConfig,

    /// CPU queue settings; queues not listed use platform defaults
    #[serde(default)]
    pub cpu_queues: Vec<QueueSettings>,

    #[serde(default)]
    pub sim: SimConfig,
}

/// Command line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub stats_interval_ms: Option<u64>,
    pub sync_send_timeout_ms: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stats_interval() -> u64 {
    1000
}

fn default_cos_supported() -> bool {
    true
}

fn default_cpu_queues() -> u8 {
    10
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_stats_interval(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            unit: 0,
            cos_supported: default_cos_supported(),
            cpu_queues: default_cpu_queues(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            stats: StatsConfig::default(),
            tx: TxConfig::default(),
            cpu_queues: Vec::new(),
            sim: SimConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Parses a YAML document.
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Loads configuration from file, falling back to defaults if it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(interval) = overrides.stats_interval_ms {
            self.stats.interval_ms = interval;
        }
        if let Some(timeout) = overrides.sync_send_timeout_ms {
            self.tx.sync_send_timeout_ms = Some(timeout);
        }
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats.interval_ms)
    }

    pub fn sync_send_timeout(&self) -> Option<Duration> {
        self.tx.sync_send_timeout_ms.map(Duration::from_millis)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stats.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "stats.interval_ms must be > 0".to_string(),
            ));
        }

        if self.tx.sync_send_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "tx.sync_send_timeout_ms must be > 0 when set".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for queue in &self.cpu_queues {
            if !seen.insert((queue.stream, queue.id)) {
                return Err(ConfigError::DuplicateQueue {
                    stream: queue.stream,
                    id: queue.id,
                });
            }
        }

        Ok(())
    }
}
