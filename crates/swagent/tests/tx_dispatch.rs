//! Transmit dispatcher behaviour against the simulated switch.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{tx_harness, tx_harness_with, wait_until};
use pretty_assertions::assert_eq;
use swagent::tx::{TxDispatcherConfig, TxError, TxMode, TxOutcome};
use swagent_hal::sim::CompletionMode;
use swagent_hal::HwStatus;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_concurrent_async_sends_complete_exactly_once() {
    let h = tx_harness(CompletionMode::Threaded);
    let threads = 8;
    let per_thread = 50;

    let workers: Vec<_> = (0..threads)
        .map(|t| {
            let tx = Arc::clone(&h.tx);
            thread::spawn(move || {
                for i in 0..per_thread {
                    let frame = [t as u8, i as u8, 0xee, 0xff];
                    assert_eq!(tx.send_frame(&frame, 0, TxMode::Async), Ok(TxOutcome::Queued));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let total = (threads * per_thread) as f64;
    assert!(wait_until(WAIT, || h.metrics.tx.completions("ok") == total));
    assert!(wait_until(WAIT, || h.sim.live_buffers() == 0));

    let m = &h.metrics.tx;
    assert_eq!(m.packets_allocated_total.get(), total);
    assert_eq!(m.packets_freed_total.get(), total);
    assert_eq!(m.packets_sent_total.get(), total);
    assert_eq!(m.completion_latency_seconds.get_sample_count(), total as u64);
    assert_eq!(h.sim.invalid_frees(), 0);
}

#[test]
fn test_sync_send_waits_for_its_own_completion() {
    let h = tx_harness(CompletionMode::Manual);

    // An unrelated asynchronous packet is in flight first.
    h.tx.send_frame(&[1; 16], 0, TxMode::Async).unwrap();
    let unrelated = h.sim.pending_completions()[0];

    let returned = Arc::new(AtomicBool::new(false));
    let sync_sender = {
        let tx = Arc::clone(&h.tx);
        let returned = Arc::clone(&returned);
        thread::spawn(move || {
            let result = tx.send_frame(&[2; 16], 0, TxMode::Sync);
            returned.store(true, Ordering::SeqCst);
            result
        })
    };
    assert!(wait_until(WAIT, || h.sim.pending_completions().len() == 2));
    let own = h.sim.pending_completions()[1];

    assert!(h.sim.complete(unrelated));
    thread::sleep(Duration::from_millis(50));
    assert!(!returned.load(Ordering::SeqCst));

    assert!(h.sim.complete(own));
    assert_eq!(sync_sender.join().unwrap(), Ok(TxOutcome::Sent));
    assert_eq!(h.sim.live_buffers(), 0);
}

#[test]
fn test_sync_senders_are_serialized() {
    let h = tx_harness(CompletionMode::Manual);

    let senders: Vec<_> = (0..3u8)
        .map(|i| {
            let tx = Arc::clone(&h.tx);
            thread::spawn(move || tx.send_frame(&[i; 8], i, TxMode::Sync))
        })
        .collect();

    // Never more than one synchronous packet in flight.
    for _ in 0..3 {
        assert!(wait_until(WAIT, || h.sim.pending_completions().len() == 1));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(h.sim.pending_completions().len(), 1);
        assert!(h.sim.complete_next());
    }

    for sender in senders {
        assert_eq!(sender.join().unwrap(), Ok(TxOutcome::Sent));
    }
    assert_eq!(h.sim.transmitted().len(), 3);
}

#[test]
fn test_sync_send_with_threaded_completion() {
    let h = tx_harness(CompletionMode::Threaded);
    for _ in 0..20 {
        assert_eq!(h.tx.send_frame(&[0; 64], 1, TxMode::Sync), Ok(TxOutcome::Sent));
    }
    assert_eq!(h.metrics.tx.completions("ok"), 20.0);
    assert_eq!(h.sim.live_buffers(), 0);
}

#[test]
fn test_buffer_exhaustion_on_allocate() {
    let h = tx_harness(CompletionMode::Inline);
    h.sim.set_alloc_failure(Some(HwStatus::NoMemory));

    let err = h.tx.send_frame(&[0; 64], 0, TxMode::Async).unwrap_err();
    assert_eq!(
        err,
        TxError::ResourceExhausted {
            status: HwStatus::NoMemory
        }
    );
    assert!(err.is_retryable());
    assert_eq!(h.metrics.tx.alloc_errors_total.get(), 1.0);
    assert_eq!(h.metrics.tx.send_errors_total.get(), 0.0);

    h.sim.set_alloc_failure(None);
    assert_eq!(h.tx.send_frame(&[0; 64], 0, TxMode::Async), Ok(TxOutcome::Queued));
}

#[test]
fn test_queue_exhaustion_on_transmit() {
    let h = tx_harness(CompletionMode::Inline);
    h.sim.fail_next_transmit(HwStatus::NoMemory);

    let err = h.tx.send_frame(&[0; 64], 0, TxMode::Async).unwrap_err();
    assert!(matches!(err, TxError::ResourceExhausted { .. }));
    assert_eq!(h.metrics.tx.alloc_errors_total.get(), 1.0);
    assert_eq!(h.sim.live_buffers(), 0);
    assert_eq!(
        h.metrics.tx.packets_allocated_total.get(),
        h.metrics.tx.packets_freed_total.get()
    );
}

#[test]
fn test_sync_timeout_and_late_completion() {
    let config = TxDispatcherConfig {
        sync_send_timeout: Some(Duration::from_millis(300)),
    };
    let h = tx_harness_with(CompletionMode::Manual, config);

    let err = h.tx.send_frame(&[0; 32], 0, TxMode::Sync).unwrap_err();
    assert_eq!(
        err,
        TxError::SyncTimeout {
            timeout: Duration::from_millis(300)
        }
    );
    assert_eq!(h.metrics.tx.sync_timeouts_total.get(), 1.0);
    let stale = h.sim.pending_completions()[0];
    assert_eq!(h.sim.live_buffers(), 1);

    // A second sync send must not be woken by the first one's completion.
    let second = {
        let tx = Arc::clone(&h.tx);
        thread::spawn(move || tx.send_frame(&[1; 32], 0, TxMode::Sync))
    };
    assert!(wait_until(WAIT, || h.sim.pending_completions().len() == 2));
    let own = h.sim.pending_completions()[1];

    // Had the stale completion woken it, the second send would report this failure.
    h.sim.set_completion_status(HwStatus::Failure);
    assert!(h.sim.complete(stale));
    assert_eq!(h.sim.live_buffers(), 1);
    thread::sleep(Duration::from_millis(20));
    assert!(!second.is_finished());

    h.sim.set_completion_status(HwStatus::Success);
    assert!(h.sim.complete(own));

    assert_eq!(second.join().unwrap(), Ok(TxOutcome::Sent));
    assert_eq!(h.sim.live_buffers(), 0);
}

#[test]
fn test_rejected_packets_are_counted_and_freed() {
    let h = tx_harness(CompletionMode::Inline);
    h.sim.fail_next_transmit(HwStatus::InvalidParameter);
    h.sim.fail_next_transmit(HwStatus::Busy);

    for _ in 0..2 {
        let err = h.tx.send_frame(&[0; 10], 0, TxMode::Async).unwrap_err();
        assert!(matches!(err, TxError::Rejected { .. }));
    }
    assert_eq!(h.metrics.tx.send_errors_total.get(), 2.0);
    assert_eq!(h.metrics.tx.packets_freed_total.get(), 2.0);
    assert_eq!(h.sim.live_buffers(), 0);
}

#[test]
fn test_metrics_exposition_after_traffic() {
    let h = tx_harness(CompletionMode::Inline);
    h.tx.send_frame(&[0; 64], 0, TxMode::Async).unwrap();

    let text = h.metrics.gather_text().unwrap();
    assert!(text.contains("swagent_tx_packets_sent_total 1"));
    assert!(text.contains("swagent_tx_completions_total{result=\"ok\"} 1"));
}
