//! CPU port (control-plane) egress queues.

mod manager;
mod types;

pub use manager::ControlPlaneQueueManager;
pub use types::{
    CosqError, PortQueueConfig, QueueCounterType, QueueSettings, QueueStatType, SchedulingPolicy,
    CPU_QUEUE_COUNTER_TYPES,
};
