//! Hardware-layer APIs consumed by the agent.
//!
//! - [`tx`]: packet buffer allocation and transmission
//! - [`stats`]: counter reads and table utilization
//! - [`cosq`]: CPU queue gport resolution

pub mod cosq;
pub mod stats;
pub mod tx;

pub use cosq::{CosqApi, StreamType};
pub use stats::{StatsApi, TableUsage, TableUtilization};
pub use tx::{PacketBuffer, TxApi, TxCompletion, TxRejected};
