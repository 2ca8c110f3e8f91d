//! AgentDaemon implementation.
//!
//! The daemon wires the transmit dispatcher, the counter synchronizer, the
//! CPU queue manager and the event handler to one hardware instance, and
//! runs the actors that drive the synchronizer:
//! - the configuration-update actor, fed through [`ConfigEvent`]s
//! - the stats-collection actor, driven by a timer

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use swagent_common::{Actor, ShutdownSignal};
use swagent_hal::SwitchHal;
use tokio::sync::mpsc;

use super::actors::{ConfigActor, ConfigEvent, StatsActor};
use crate::config::AgentConfig;
use crate::cosq::{ControlPlaneQueueManager, QueueSettings};
use crate::error::Result;
use crate::events::SwitchEventHandler;
use crate::fatal::FatalPath;
use crate::metrics::AgentMetrics;
use crate::stats::CounterSynchronizer;
use crate::tx::{TxDispatcher, TxDispatcherConfig};

/// Configuration for the AgentDaemon.
#[derive(Debug, Clone)]
pub struct AgentDaemonConfig {
    /// Interval between two counter collection passes
    pub stats_interval: Duration,
    /// Transmit dispatcher settings
    pub tx: TxDispatcherConfig,
    /// Configured CPU queue settings
    pub cpu_queues: Vec<QueueSettings>,
    /// Capacity of the configuration event channel
    pub event_queue_depth: usize,
}

impl Default for AgentDaemonConfig {
    fn default() -> Self {
        Self {
            stats_interval: Duration::from_secs(1),
            tx: TxDispatcherConfig::default(),
            cpu_queues: Vec::new(),
            event_queue_depth: 1024,
        }
    }
}

impl From<&AgentConfig> for AgentDaemonConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            stats_interval: config.stats_interval(),
            tx: TxDispatcherConfig {
                sync_send_timeout: config.sync_send_timeout(),
            },
            cpu_queues: config.cpu_queues.clone(),
            ..Self::default()
        }
    }
}

/// The switch agent daemon.
pub struct AgentDaemon {
    config: AgentDaemonConfig,
    metrics: AgentMetrics,
    tx: Arc<TxDispatcher>,
    sync: Arc<CounterSynchronizer>,
    cosq: ControlPlaneQueueManager,
    events: Arc<SwitchEventHandler>,
    config_tx: mpsc::Sender<ConfigEvent>,
    config_rx: Option<mpsc::Receiver<ConfigEvent>>,
}

impl AgentDaemon {
    pub fn new(
        config: AgentDaemonConfig,
        hal: Arc<dyn SwitchHal>,
        metrics: AgentMetrics,
        fatal: Arc<FatalPath>,
    ) -> Result<Self> {
        info!("Initializing agent on unit {}", hal.unit());

        let cosq = ControlPlaneQueueManager::new(Arc::clone(&hal), &config.cpu_queues)?;
        let tx = Arc::new(TxDispatcher::new(
            config.tx.clone(),
            Arc::clone(&hal),
            metrics.tx.clone(),
            Arc::clone(&fatal),
        ));
        let sync = Arc::new(CounterSynchronizer::new(hal, metrics.sync.clone()));
        let events = Arc::new(SwitchEventHandler::new(metrics.events.clone(), fatal));
        let (config_tx, config_rx) = mpsc::channel(config.event_queue_depth.max(1));

        Ok(Self {
            config,
            metrics,
            tx,
            sync,
            cosq,
            events,
            config_tx,
            config_rx: Some(config_rx),
        })
    }

    pub fn config(&self) -> &AgentDaemonConfig {
        &self.config
    }

    pub fn metrics(&self) -> &AgentMetrics {
        &self.metrics
    }

    pub fn tx(&self) -> Arc<TxDispatcher> {
        Arc::clone(&self.tx)
    }

    pub fn synchronizer(&self) -> Arc<CounterSynchronizer> {
        Arc::clone(&self.sync)
    }

    pub fn cosq(&self) -> &ControlPlaneQueueManager {
        &self.cosq
    }

    /// Returns the handler to register with the hardware event callback.
    pub fn event_handler(&self) -> Arc<SwitchEventHandler> {
        Arc::clone(&self.events)
    }

    /// Returns a sender for configuration events.
    pub fn config_sender(&self) -> mpsc::Sender<ConfigEvent> {
        self.config_tx.clone()
    }

    /// Runs the actors until `shutdown` fires.
    ///
    /// Can only run once; the configuration channel is consumed.
    pub async fn run(&mut self, shutdown: ShutdownSignal) {
        let Some(config_rx) = self.config_rx.take() else {
            warn!("AgentDaemon already ran, ignoring");
            return;
        };

        let actors: Vec<Box<dyn Actor>> = vec![
            Box::new(ConfigActor::new(config_rx, Arc::clone(&self.sync))),
            Box::new(StatsActor::new(
                self.config.stats_interval,
                Arc::clone(&self.sync),
            )),
        ];

        let handles: Vec<_> = actors
            .into_iter()
            .map(|mut actor| {
                let signal = shutdown.clone();
                tokio::spawn(async move {
                    info!("Starting {} actor", actor.name());
                    actor.run(signal).await;
                    info!("{} actor stopped", actor.name());
                })
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                error!("actor task failed: {}", e);
            }
        }
    }
}
