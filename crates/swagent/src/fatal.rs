//! Fatal error path.
//!
//! A fatal hardware status leaves the ASIC in an unknown state, so the agent
//! does not try to recover: it logs, gives the registered [`FatalHandler`] a
//! chance to dump state, and terminates the process.

use std::fmt;
use std::sync::Arc;

use log::error;
use swagent_hal::{FatalHandler, HwError, HwStatus};

use crate::metrics::AgentMetrics;

/// Logs, runs the fatal handler, then terminates.
pub struct FatalPath {
    handler: Option<Arc<dyn FatalHandler>>,
    terminate: fn() -> !,
}

impl FatalPath {
    /// Creates a fatal path that aborts the process.
    pub fn new() -> Self {
        Self {
            handler: None,
            terminate: std::process::abort,
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn FatalHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Replaces the final termination step. Tests use a panicking one.
    pub fn with_terminate(mut self, terminate: fn() -> !) -> Self {
        self.terminate = terminate;
        self
    }

    /// Logs a fatal status and terminates. Never returns.
    pub fn log_fatal(&self, status: HwStatus, context: &str) -> ! {
        error!("{}: {} ({})", context, status, status.as_raw());
        if let Some(handler) = &self.handler {
            handler.exit_fatal();
        }
        (self.terminate)()
    }

    /// Passes non-fatal errors through and terminates on fatal ones.
    pub fn escalate(&self, err: HwError) -> HwError {
        if err.is_fatal() {
            let status = err.status().unwrap_or(HwStatus::Fatal);
            self.log_fatal(status, &err.to_string());
        }
        err
    }
}

impl Default for FatalPath {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FatalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FatalPath")
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Fatal handler that dumps the agent's metrics to the log.
pub struct MetricsDumpHandler {
    metrics: AgentMetrics,
}

impl MetricsDumpHandler {
    pub fn new(metrics: AgentMetrics) -> Self {
        Self { metrics }
    }
}

impl FatalHandler for MetricsDumpHandler {
    fn exit_fatal(&self) {
        match self.metrics.gather_text() {
            Ok(text) => error!("agent state at fatal exit:\n{}", text),
            Err(e) => error!("failed to dump agent state: {}", e),
        }
    }
}
