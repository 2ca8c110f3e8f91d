//! Shared fixtures for the agent integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use swagent::fatal::FatalPath;
use swagent::metrics::AgentMetrics;
use swagent::stats::CounterSynchronizer;
use swagent::tx::{TxDispatcher, TxDispatcherConfig};
use swagent_hal::sim::{CompletionMode, SimSwitch};
use swagent_hal::CounterHandle;

pub struct TxHarness {
    pub sim: Arc<SimSwitch>,
    pub metrics: AgentMetrics,
    pub tx: Arc<TxDispatcher>,
}

pub fn tx_harness(mode: CompletionMode) -> TxHarness {
    tx_harness_with(mode, TxDispatcherConfig::default())
}

pub fn tx_harness_with(mode: CompletionMode, config: TxDispatcherConfig) -> TxHarness {
    let sim = Arc::new(SimSwitch::new().with_completion_mode(mode));
    let metrics = AgentMetrics::new().unwrap();
    let tx = Arc::new(TxDispatcher::new(
        config,
        sim.clone(),
        metrics.tx.clone(),
        Arc::new(FatalPath::new()),
    ));
    TxHarness { sim, metrics, tx }
}

pub struct SyncHarness {
    pub sim: Arc<SimSwitch>,
    pub metrics: AgentMetrics,
    pub sync: Arc<CounterSynchronizer>,
}

pub fn sync_harness() -> SyncHarness {
    let sim = Arc::new(SimSwitch::new());
    let metrics = AgentMetrics::new().unwrap();
    let sync = Arc::new(CounterSynchronizer::new(sim.clone(), metrics.sync.clone()));
    SyncHarness { sim, metrics, sync }
}

pub fn counter(raw: u64) -> CounterHandle {
    CounterHandle::from_raw_unchecked(raw)
}

/// Polls `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}
