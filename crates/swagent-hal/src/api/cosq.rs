//! Class-of-service queue API.
//!
//! Egress queues are addressed in hardware through gports. The control-plane
//! (CPU) port only has multicast queues on the supported ASICs.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{HwError, HwResult};
use crate::types::Gport;

/// Traffic stream a queue serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Unicast,
    Multicast,
    All,
}

impl StreamType {
    /// Returns the configuration name of the stream type.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Unicast => "unicast",
            StreamType::Multicast => "multicast",
            StreamType::All => "all",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamType {
    type Err = HwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unicast" => Ok(StreamType::Unicast),
            "multicast" => Ok(StreamType::Multicast),
            "all" => Ok(StreamType::All),
            other => Err(HwError::invalid_parameter(format!(
                "unknown stream type: {}",
                other
            ))),
        }
    }
}

/// Queue primitives of the hardware layer.
pub trait CosqApi: Send + Sync {
    /// Returns true if the platform supports class-of-service queuing.
    fn is_cos_supported(&self) -> bool;

    /// Returns how many CPU queues of the given stream type the ASIC exposes.
    fn num_cpu_queues(&self, stream: StreamType) -> u8;

    /// Resolves the gport of a CPU egress queue.
    ///
    /// Fails with [`HwError::Unsupported`] if the platform or the stream type
    /// does not support CoS queues.
    fn resolve_gport(&self, stream: StreamType, queue: u8) -> HwResult<Gport>;
}
