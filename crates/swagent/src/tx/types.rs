//! Transmit modes, outcomes and errors.

use std::fmt;
use std::time::Duration;

use swagent_hal::{HwError, HwStatus};
use thiserror::Error;

/// How a send waits for the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxMode {
    /// Return once the hardware accepted the packet.
    Async,
    /// Block until the hardware finished transmitting the packet.
    Sync,
}

impl fmt::Display for TxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxMode::Async => write!(f, "async"),
            TxMode::Sync => write!(f, "sync"),
        }
    }
}

/// Successful result of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    /// Accepted by the hardware; completion will follow.
    Queued,
    /// Transmitted; the completion already fired with success.
    Sent,
}

/// Transmit error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("refusing to send an empty packet")]
    EmptyPacket,

    /// Out of packet buffers or hardware queue space. Retry later.
    #[error("transmit resources exhausted ({status})")]
    ResourceExhausted { status: HwStatus },

    /// The hardware refused the submission.
    #[error("transmit rejected: {status} ({code})", code = status.as_raw())]
    Rejected { status: HwStatus },

    /// The packet was submitted but its completion reported a failure.
    #[error("transmit completed with {status}")]
    CompletionFailed { status: HwStatus },

    /// A synchronous send gave up waiting for its completion.
    #[error("no transmit completion within {timeout:?}")]
    SyncTimeout { timeout: Duration },

    /// Packet buffer allocation failed for a reason other than exhaustion.
    #[error("packet allocation failed: {0}")]
    Allocation(HwError),
}

impl TxError {
    /// Classifies a refused submission.
    pub fn from_rejection(status: HwStatus) -> Self {
        if status.is_resource_exhausted() {
            TxError::ResourceExhausted { status }
        } else {
            TxError::Rejected { status }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, TxError::ResourceExhausted { .. })
    }

    /// Returns the hardware status behind this error, if any.
    pub fn status(&self) -> Option<HwStatus> {
        match self {
            TxError::ResourceExhausted { status }
            | TxError::Rejected { status }
            | TxError::CompletionFailed { status } => Some(*status),
            TxError::Allocation(err) => err.status(),
            TxError::EmptyPacket | TxError::SyncTimeout { .. } => None,
        }
    }
}

/// Result type for transmit operations.
pub type TxResult<T> = Result<T, TxError>;
