//! Counter synchronizer behaviour under concurrent refresh and collect.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{counter, sync_harness};
use pretty_assertions::assert_eq;
use swagent::stats::StateDelta;
use swagent_hal::{TableUsage, TableUtilization};

#[test]
fn test_add_then_collect_reads_hardware_value() {
    let h = sync_harness();
    let acl_drop = counter(7);

    h.sync.enqueue_add(acl_drop, "acl_drop");
    h.sync.refresh(&StateDelta::to_generation(1));
    let tracked = h.sync.get_counter(acl_drop).unwrap();
    assert_eq!(tracked.name(), "acl_drop");
    assert_eq!(tracked.value(), 0);

    h.sim.set_counter_value(acl_drop, 42);
    let summary = h.sync.collect();
    assert_eq!(summary.sampled, 1);
    assert_eq!(h.sync.get_counter(acl_drop).unwrap().value(), 42);
}

#[test]
fn test_double_remove_is_harmless() {
    let h = sync_harness();
    let handle = counter(3);
    h.sync.enqueue_add(handle, "q3");
    h.sync.refresh(&StateDelta::to_generation(1));

    h.sync.enqueue_remove(handle);
    h.sync.enqueue_remove(handle);
    let summary = h.sync.refresh(&StateDelta::to_generation(2));

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.ignored, 1);
    assert!(h.sync.get_counter(handle).is_none());
    assert_eq!(h.sync.counter_count(), 0);
}

#[test]
fn test_add_then_remove_before_refresh_leaves_nothing() {
    let h = sync_harness();
    let handle = counter(11);
    h.sync.enqueue_add(handle, "x");
    h.sync.enqueue_remove(handle);
    assert_eq!(h.sync.pending_count(), 2);

    h.sync.refresh(&StateDelta::to_generation(1));
    assert!(h.sync.get_counter(handle).is_none());
    assert_eq!(h.sync.pending_count(), 0);
    assert_eq!(h.metrics.sync.pending_mutations.get(), 0.0);
}

#[test]
fn test_collect_never_updates_removed_counter() {
    let h = sync_harness();
    for raw in 1..=16 {
        h.sim.set_counter_value(counter(raw), raw * 100);
        h.sync.enqueue_add(counter(raw), format!("c{}", raw));
    }
    h.sync.refresh(&StateDelta::to_generation(1));

    let stop = Arc::new(AtomicBool::new(false));
    let collector = {
        let sync = Arc::clone(&h.sync);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut passes = 0u64;
            while !stop.load(Ordering::SeqCst) {
                sync.collect();
                passes += 1;
            }
            passes
        })
    };

    for raw in 1..=16 {
        let handle = counter(raw);
        let torn_down = h.sync.get_counter(handle).unwrap();
        h.sync.enqueue_remove(handle);
        h.sync.refresh(&StateDelta::to_generation(raw + 1));

        let samples_at_removal = torn_down.samples();
        thread::sleep(Duration::from_millis(2));
        assert_eq!(torn_down.samples(), samples_at_removal);
    }

    stop.store(true, Ordering::SeqCst);
    assert!(collector.join().unwrap() > 0);
    assert_eq!(h.sync.counter_count(), 0);
}

#[test]
fn test_table_stats_snapshot_is_never_torn() {
    let h = sync_harness();
    let stop = Arc::new(AtomicBool::new(false));

    let reader = {
        let sync = Arc::clone(&h.sync);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut reads = 0u64;
            while !stop.load(Ordering::SeqCst) {
                let stats = sync.hw_table_stats();
                // Generation g wrote used == g to every table and 2g to the IPv6 host count.
                for (table, usage) in stats.tables() {
                    assert_eq!(usage.used, stats.generation, "table {}", table);
                }
                let u = &stats.utilization;
                assert_eq!(u.l3_ipv4_host_used, stats.generation);
                assert_eq!(u.l3_ipv6_host_used, 2 * stats.generation);
                reads += 1;
            }
            reads
        })
    };

    for generation in 1..=500u64 {
        let usage = TableUsage::new(1_000_000, generation);
        h.sim.set_table_utilization(TableUtilization {
            l3_host: usage,
            l3_ipv4_host_used: generation,
            l3_ipv6_host_used: 2 * generation,
            l3_nexthops: usage,
            l3_ecmp_groups: usage,
            lpm_ipv4: usage,
            lpm_ipv6: usage,
            acl_entries: usage,
            acl_counters: usage,
        });
        h.sync.refresh(&StateDelta::to_generation(generation));
    }

    stop.store(true, Ordering::SeqCst);
    assert!(reader.join().unwrap() > 0);
    assert_eq!(h.sync.hw_table_stats().generation, 500);
}

#[test]
fn test_enqueue_from_many_threads() {
    let h = sync_harness();
    let producers: Vec<_> = (0..4u64)
        .map(|t| {
            let sync = Arc::clone(&h.sync);
            thread::spawn(move || {
                for i in 0..25 {
                    sync.enqueue_add(counter(t * 100 + i + 1), format!("t{}-{}", t, i));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let summary = h.sync.refresh(&StateDelta::to_generation(1));
    assert_eq!(summary.added, 100);
    assert_eq!(h.sync.counter_count(), 100);
    assert_eq!(h.metrics.sync.counters_tracked.get(), 100.0);
}
