//! Control-plane queue types.

use serde::Deserialize;
use swagent_hal::{HwError, StreamType};
use thiserror::Error;

/// Statistic a queue counter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStatType {
    DroppedPackets,
    OutPackets,
}

/// One per-queue counter exported for the CPU port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueCounterType {
    pub stream: StreamType,
    pub stat: QueueStatType,
    pub name: &'static str,
}

/// Counters exported for every CPU queue. Named from the host's point of view.
pub const CPU_QUEUE_COUNTER_TYPES: [QueueCounterType; 2] = [
    QueueCounterType {
        stream: StreamType::Multicast,
        stat: QueueStatType::DroppedPackets,
        name: "in_dropped_pkts",
    },
    QueueCounterType {
        stream: StreamType::Multicast,
        stat: QueueStatType::OutPackets,
        name: "in_pkts",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    #[default]
    WeightedRoundRobin,
    StrictPriority,
}

/// Settings of one CPU egress queue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueSettings {
    pub id: u8,
    #[serde(default = "default_stream")]
    pub stream: StreamType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub scheduling: SchedulingPolicy,
    #[serde(default)]
    pub reserved_bytes: Option<u64>,
}

fn default_stream() -> StreamType {
    StreamType::Multicast
}

fn default_weight() -> u32 {
    1
}

impl QueueSettings {
    /// Platform default for a queue of the given stream type.
    pub fn default_for(stream: StreamType, id: u8) -> Self {
        Self {
            id,
            stream,
            name: None,
            weight: default_weight(),
            scheduling: SchedulingPolicy::WeightedRoundRobin,
            reserved_bytes: None,
        }
    }
}

/// Queue settings of a port, split by stream type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortQueueConfig {
    pub unicast: Vec<QueueSettings>,
    pub multicast: Vec<QueueSettings>,
}

/// Control-plane queue error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CosqError {
    #[error("failed to retrieve queue gport: {reason}")]
    Unsupported { reason: String },

    #[error("no {stream} queue {queue} on the CPU port")]
    QueueNotFound { stream: StreamType, queue: u8 },

    #[error(transparent)]
    Hw(#[from] HwError),
}
