//! CounterSynchronizer implementation.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::RwLock;
use swagent_common::{PendingQueue, Snapshot, SyncMap};
use swagent_hal::{CounterHandle, SwitchHal};

use super::types::{HwTableStats, MonotonicCounter, PendingMutation, StateDelta};
use crate::metrics::SyncMetrics;

/// What one refresh changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub added: usize,
    pub removed: usize,
    pub ignored: usize,
    pub table_stats_updated: bool,
}

/// What one collection pass read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub sampled: usize,
    pub failed: usize,
}

/// Keeps tracked hardware counters in step with switch state.
///
/// The configuration side enqueues additions and removals; they take effect
/// at the next [`refresh`](Self::refresh). The stats side periodically calls
/// [`collect`](Self::collect). Each side only ever waits on the other for the
/// length of one table pass.
pub struct CounterSynchronizer {
    hal: Arc<dyn SwitchHal>,
    pending: PendingQueue<PendingMutation>,
    counters: RwLock<SyncMap<CounterHandle, Arc<MonotonicCounter>>>,
    table_stats: Snapshot<HwTableStats>,
    metrics: SyncMetrics,
}

impl CounterSynchronizer {
    pub fn new(hal: Arc<dyn SwitchHal>, metrics: SyncMetrics) -> Self {
        Self {
            hal,
            pending: PendingQueue::new(),
            counters: RwLock::new(SyncMap::new()),
            table_stats: Snapshot::default(),
            metrics,
        }
    }

    /// Schedules tracking of `handle` from the next refresh on.
    pub fn enqueue_add(&self, handle: CounterHandle, name: impl Into<String>) {
        self.pending.push(PendingMutation::Add {
            handle,
            name: name.into(),
        });
        self.metrics.pending_mutations.set(self.pending.len() as f64);
    }

    /// Schedules `handle` to stop being tracked at the next refresh.
    pub fn enqueue_remove(&self, handle: CounterHandle) {
        self.pending.push(PendingMutation::Remove { handle });
        self.metrics.pending_mutations.set(self.pending.len() as f64);
    }

    /// Applies pending mutations in order and recomputes table stats.
    pub fn refresh(&self, delta: &StateDelta) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        let mutations = self.pending.drain();
        self.metrics.pending_mutations.set(self.pending.len() as f64);

        if !mutations.is_empty() {
            let mut counters = self.counters.write();
            for mutation in mutations {
                match mutation {
                    PendingMutation::Add { handle, name } => {
                        let counter = Arc::new(MonotonicCounter::new(name));
                        match counters.insert_new(handle, counter) {
                            Ok(()) => summary.added += 1,
                            Err(e) => {
                                debug!("ignoring counter add: {}", e);
                                summary.ignored += 1;
                            }
                        }
                    }
                    PendingMutation::Remove { handle } => {
                        match counters.remove_existing(&handle) {
                            Ok(_) => summary.removed += 1,
                            Err(e) => {
                                debug!("ignoring counter removal: {}", e);
                                summary.ignored += 1;
                            }
                        }
                    }
                }
            }
            self.metrics.counters_tracked.set(counters.len() as f64);
        }

        summary.table_stats_updated = self.refresh_table_stats(delta);
        self.metrics.refreshes_total.inc();

        if summary.added > 0 || summary.removed > 0 {
            info!(
                "generation {}: tracking {} counters (+{} -{})",
                delta.new_generation,
                self.counter_count(),
                summary.added,
                summary.removed
            );
        }
        summary
    }

    /// Rebuilds the table stats snapshot. Keeps the old one on failure.
    fn refresh_table_stats(&self, delta: &StateDelta) -> bool {
        match self.hal.query_table_utilization() {
            Ok(utilization) => {
                self.table_stats
                    .store(HwTableStats::new(delta.new_generation, utilization));
                true
            }
            Err(e) => {
                self.metrics.table_query_errors_total.inc();
                warn!(
                    "keeping hw table stats of generation {}: {}",
                    self.table_stats.load().generation,
                    e
                );
                false
            }
        }
    }

    /// Reads every tracked counter from the hardware.
    pub fn collect(&self) -> CollectSummary {
        let mut summary = CollectSummary::default();
        let now = Instant::now();
        {
            let counters = self.counters.read();
            for (handle, counter) in counters.iter() {
                match self.hal.query_counter_value(*handle) {
                    Ok(value) => {
                        counter.update(value, now);
                        summary.sampled += 1;
                    }
                    Err(e) => {
                        summary.failed += 1;
                        debug!("failed to read counter {} ({}): {}", counter.name(), handle, e);
                    }
                }
            }
        }

        if summary.failed > 0 {
            self.metrics.collect_errors_total.inc_by(summary.failed as f64);
            warn!(
                "{} of {} counter reads failed",
                summary.failed,
                summary.sampled + summary.failed
            );
        }
        self.metrics.collections_total.inc();
        self.publish_table_stats();
        summary
    }

    fn publish_table_stats(&self) {
        let stats = self.table_stats.load();
        for (table, usage) in stats.tables() {
            self.metrics.set_table_usage(table, usage);
        }
    }

    /// Returns the counter tracked for `handle`.
    pub fn get_counter(&self, handle: CounterHandle) -> Option<Arc<MonotonicCounter>> {
        self.counters.read().get(&handle).cloned()
    }

    /// Returns the latest table stats snapshot without waiting on refresh.
    pub fn hw_table_stats(&self) -> Arc<HwTableStats> {
        self.table_stats.load()
    }

    pub fn counter_count(&self) -> usize {
        self.counters.read().len()
    }

    /// Mutations waiting for the next refresh.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::AgentMetrics;
    use pretty_assertions::assert_eq;
    use swagent_hal::sim::SimSwitch;
    use swagent_hal::{HwStatus, TableUsage, TableUtilization};

    fn handle(raw: u64) -> CounterHandle {
        CounterHandle::from_raw_unchecked(raw)
    }

    fn synchronizer() -> (Arc<SimSwitch>, CounterSynchronizer) {
        let sim = Arc::new(SimSwitch::new());
        let metrics = AgentMetrics::new().unwrap();
        (sim.clone(), CounterSynchronizer::new(sim, metrics.sync))
    }

    #[test]
    fn test_enqueue_does_not_touch_table() {
        let (_sim, sync) = synchronizer();
        sync.enqueue_add(handle(1), "a");
        assert_eq!(sync.pending_count(), 1);
        assert_eq!(sync.counter_count(), 0);
        assert!(sync.get_counter(handle(1)).is_none());
    }

    #[test]
    fn test_refresh_applies_in_order() {
        let (_sim, sync) = synchronizer();
        sync.enqueue_add(handle(1), "a");
        sync.enqueue_add(handle(2), "b");
        sync.enqueue_remove(handle(1));

        let summary = sync.refresh(&StateDelta::to_generation(1));
        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 1);
        assert_eq!(sync.pending_count(), 0);
        assert!(sync.get_counter(handle(1)).is_none());
        assert_eq!(sync.get_counter(handle(2)).unwrap().name(), "b");
    }

    #[test]
    fn test_remove_then_add_keeps_counter() {
        let (_sim, sync) = synchronizer();
        sync.enqueue_add(handle(4), "old");
        sync.refresh(&StateDelta::to_generation(1));

        sync.enqueue_remove(handle(4));
        sync.enqueue_add(handle(4), "new");
        sync.refresh(&StateDelta::to_generation(2));

        assert_eq!(sync.get_counter(handle(4)).unwrap().name(), "new");
    }

    #[test]
    fn test_duplicate_add_keeps_existing_counter() {
        let (sim, sync) = synchronizer();
        sim.set_counter_value(handle(9), 10);
        sync.enqueue_add(handle(9), "first");
        sync.refresh(&StateDelta::to_generation(1));
        sync.collect();

        sync.enqueue_add(handle(9), "second");
        let summary = sync.refresh(&StateDelta::to_generation(2));
        assert_eq!(summary.ignored, 1);
        let counter = sync.get_counter(handle(9)).unwrap();
        assert_eq!(counter.name(), "first");
        assert_eq!(counter.value(), 10);
    }

    #[test]
    fn test_refresh_replaces_table_stats() {
        let (sim, sync) = synchronizer();
        assert_eq!(sync.hw_table_stats().generation, 0);

        let mut utilization = TableUtilization::default();
        utilization.acl_entries = TableUsage::new(512, 12);
        sim.set_table_utilization(utilization);
        assert!(sync.refresh(&StateDelta::to_generation(3)).table_stats_updated);

        let stats = sync.hw_table_stats();
        assert_eq!(stats.generation, 3);
        assert_eq!(stats.utilization.acl_entries.used, 12);
    }

    #[test]
    fn test_failed_table_query_keeps_snapshot() {
        let (sim, sync) = synchronizer();
        sync.refresh(&StateDelta::to_generation(1));
        sim.set_table_query_failure(Some(HwStatus::Busy));

        let summary = sync.refresh(&StateDelta::to_generation(2));
        assert!(!summary.table_stats_updated);
        assert_eq!(sync.hw_table_stats().generation, 1);
    }

    #[test]
    fn test_collect_counts_failed_reads() {
        let (sim, sync) = synchronizer();
        sim.set_counter_value(handle(1), 5);
        sync.enqueue_add(handle(1), "known");
        sync.enqueue_add(handle(2), "unknown");
        sync.refresh(&StateDelta::to_generation(1));

        let summary = sync.collect();
        assert_eq!(summary, CollectSummary { sampled: 1, failed: 1 });
        assert_eq!(sync.get_counter(handle(1)).unwrap().value(), 5);
        assert_eq!(sync.get_counter(handle(2)).unwrap().value(), 0);
    }

    #[test]
    fn test_collect_publishes_table_gauges() {
        let sim = Arc::new(SimSwitch::new());
        let metrics = AgentMetrics::new().unwrap();
        let sync = CounterSynchronizer::new(sim.clone(), metrics.sync.clone());

        let mut utilization = TableUtilization::default();
        utilization.l3_host = TableUsage::new(8192, 40);
        sim.set_table_utilization(utilization);
        sync.refresh(&StateDelta::to_generation(1));
        sync.collect();

        assert_eq!(metrics.sync.table_used("l3_host"), 40.0);
    }
}
