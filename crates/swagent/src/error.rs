//! Error types for the switch agent.

use std::path::PathBuf;

use swagent_hal::{HwError, StreamType};
use thiserror::Error;

use crate::cosq::CosqError;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("duplicate {stream} CPU queue id {id}")]
    DuplicateQueue { stream: StreamType, id: u8 },
}

/// Errors that stop the agent from starting or running.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("control-plane queue error: {0}")]
    Cosq(#[from] CosqError),

    #[error("hardware error: {0}")]
    Hw(#[from] HwError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
