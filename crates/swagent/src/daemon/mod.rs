//! Agent daemon and its actors.

mod actors;
mod agent;

pub use actors::{ConfigActor, ConfigEvent, StatsActor};
pub use agent::{AgentDaemon, AgentDaemonConfig};
