//! The configuration-update and stats-collection actors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use swagent_common::{Actor, ShutdownSignal};
use swagent_hal::CounterHandle;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::stats::{CounterSynchronizer, StateDelta};

/// Message to the configuration-update actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    AddCounter { handle: CounterHandle, name: String },
    RemoveCounter { handle: CounterHandle },
    /// Switch state moved to a new generation; apply pending changes.
    StateChanged(StateDelta),
}

/// Turns configuration events into counter synchronizer calls.
pub struct ConfigActor {
    events: mpsc::Receiver<ConfigEvent>,
    sync: Arc<CounterSynchronizer>,
}

impl ConfigActor {
    pub fn new(events: mpsc::Receiver<ConfigEvent>, sync: Arc<CounterSynchronizer>) -> Self {
        Self { events, sync }
    }
}

async fn apply(sync: &Arc<CounterSynchronizer>, event: ConfigEvent) {
    match event {
        ConfigEvent::AddCounter { handle, name } => sync.enqueue_add(handle, name),
        ConfigEvent::RemoveCounter { handle } => sync.enqueue_remove(handle),
        ConfigEvent::StateChanged(delta) => {
            let sync = Arc::clone(sync);
            match tokio::task::spawn_blocking(move || sync.refresh(&delta)).await {
                Ok(summary) => debug!(
                    "refresh for generation {}: {:?}",
                    delta.new_generation, summary
                ),
                Err(e) => error!("counter refresh task failed: {}", e),
            }
        }
    }
}

#[async_trait]
impl Actor for ConfigActor {
    fn name(&self) -> &str {
        "config"
    }

    async fn run(&mut self, mut shutdown: ShutdownSignal) {
        loop {
            let event = tokio::select! {
                _ = shutdown.wait() => break,
                event = self.events.recv() => event,
            };
            match event {
                Some(event) => apply(&self.sync, event).await,
                None => {
                    info!("config event channel closed");
                    break;
                }
            }
        }
    }
}

/// Periodically samples every tracked counter.
pub struct StatsActor {
    interval: Duration,
    sync: Arc<CounterSynchronizer>,
}

impl StatsActor {
    pub fn new(interval: Duration, sync: Arc<CounterSynchronizer>) -> Self {
        Self { interval, sync }
    }

    async fn collect_once(&self) {
        let sync = Arc::clone(&self.sync);
        match tokio::task::spawn_blocking(move || sync.collect()).await {
            Ok(summary) => debug!(
                "collected {} counters ({} failed)",
                summary.sampled, summary.failed
            ),
            Err(e) => error!("counter collection task failed: {}", e),
        }
    }
}

#[async_trait]
impl Actor for StatsActor {
    fn name(&self) -> &str {
        "stats"
    }

    async fn run(&mut self, mut shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = ticker.tick() => self.collect_once().await,
            }
        }
    }
}
