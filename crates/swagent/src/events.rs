//! Asynchronous hardware event handling.
//!
//! Events the ASIC raises are either non-fatal (counted per alarm and logged)
//! or fatal (the agent cannot continue and goes down the fatal path).

use std::collections::HashSet;
use std::sync::Arc;

use log::error;
use swagent_hal::{HwStatus, SwitchEvent, SwitchEventKind};

use crate::fatal::FatalPath;
use crate::metrics::EventMetrics;

/// Events that take the agent down by default.
pub const DEFAULT_FATAL_EVENTS: [SwitchEventKind; 4] = [
    SwitchEventKind::StableFull,
    SwitchEventKind::StableError,
    SwitchEventKind::UncontrolledShutdown,
    SwitchEventKind::WarmBootDowngrade,
];

pub struct SwitchEventHandler {
    fatal_kinds: HashSet<SwitchEventKind>,
    metrics: EventMetrics,
    fatal: Arc<FatalPath>,
}

impl SwitchEventHandler {
    pub fn new(metrics: EventMetrics, fatal: Arc<FatalPath>) -> Self {
        Self {
            fatal_kinds: DEFAULT_FATAL_EVENTS.into_iter().collect(),
            metrics,
            fatal,
        }
    }

    /// Replaces the set of events treated as fatal.
    pub fn with_fatal_kinds(mut self, kinds: impl IntoIterator<Item = SwitchEventKind>) -> Self {
        self.fatal_kinds = kinds.into_iter().collect();
        self
    }

    pub fn is_fatal(&self, kind: SwitchEventKind) -> bool {
        self.fatal_kinds.contains(&kind)
    }

    /// Entry point for the hardware event callback.
    pub fn handle(&self, event: SwitchEvent) {
        let alarm = event.kind.alarm_name();
        let [arg1, arg2, arg3] = event.args;
        if self.is_fatal(event.kind) {
            self.fatal.log_fatal(
                HwStatus::Fatal,
                &format!(
                    "fatal error on unit {}: {} with params {}, {}, {}",
                    event.unit, alarm, arg1, arg2, arg3
                ),
            );
        }

        self.metrics.record_event(&alarm);
        error!(
            "non-fatal error on unit {}: {} with params {}, {}, {}",
            event.unit, alarm, arg1, arg2, arg3
        );
    }
}
