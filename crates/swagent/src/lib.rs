//! Switch agent core.
//!
//! Two responsibilities of a switch control-plane agent:
//!
//! - transmitting control-plane generated packets onto CPU egress queues,
//!   either fire-and-forget or blocking until the hardware sent them
//! - keeping the set of tracked hardware counters in step with switch state
//!   while a periodic collector samples them
//!
//! # Architecture
//!
//! ```text
//!            ┌──────────────── AgentDaemon ────────────────┐
//! ConfigEvent│  ConfigActor ──enqueue/refresh──┐           │
//!  ─────────>│                                 ▼           │
//!            │  StatsActor ───collect──> CounterSynchronizer ──> StatsApi
//!            │                                             │
//! callers ──>│  TxDispatcher ──────────────────────────────────> TxApi
//!            │  ControlPlaneQueueManager ──────────────────────> CosqApi
//! hw events ─│─>SwitchEventHandler ──fatal──> FatalPath    │
//!            └─────────────────────────────────────────────┘
//! ```
//!
//! # Key Components
//!
//! - [`tx::TxDispatcher`]: ASYNC and SYNC packet transmit
//! - [`stats::CounterSynchronizer`]: counter table, pending mutations, table stats
//! - [`cosq::ControlPlaneQueueManager`]: CPU queue gports and settings
//! - [`events::SwitchEventHandler`]: hardware event accounting
//! - [`daemon::AgentDaemon`]: actors driving the above

pub mod config;
pub mod cosq;
pub mod daemon;
pub mod error;
pub mod events;
pub mod fatal;
pub mod metrics;
pub mod stats;
pub mod tx;

pub use error::{AgentError, ConfigError, Result};
