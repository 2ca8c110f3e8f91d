//! Serialization and completion wait for synchronous sends.
//!
//! Only one synchronous send is outstanding at a time. The caller holds the
//! gate's turn lock for the whole call; the completion reports through a
//! notifier stamped with the caller's ticket. A completion that arrives after
//! its caller stopped waiting carries a stale ticket and is ignored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::{Condvar, Mutex, MutexGuard};
use swagent_hal::HwStatus;

#[derive(Debug, Default)]
struct GateState {
    ticket: u64,
    result: Option<HwStatus>,
}

/// Owned by the dispatcher; replaces a process-wide mutex and condvar pair.
#[derive(Debug, Default)]
pub(crate) struct SyncSendGate {
    turn: Mutex<()>,
    state: Mutex<GateState>,
    done: Condvar,
}

impl SyncSendGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits for the previous synchronous send to finish and opens a new one.
    pub(crate) fn enter(self: &Arc<Self>) -> SyncTurn<'_> {
        let turn = self.turn.lock();
        let ticket = {
            let mut state = self.state.lock();
            state.ticket = state.ticket.wrapping_add(1);
            state.result = None;
            state.ticket
        };
        SyncTurn {
            gate: self,
            ticket,
            _turn: turn,
        }
    }
}

/// One synchronous send in progress. Dropping it lets the next one in.
pub(crate) struct SyncTurn<'a> {
    gate: &'a Arc<SyncSendGate>,
    ticket: u64,
    _turn: MutexGuard<'a, ()>,
}

impl SyncTurn<'_> {
    /// Returns the handle the completion reports through.
    pub(crate) fn notifier(&self) -> SyncNotifier {
        SyncNotifier {
            gate: Arc::clone(self.gate),
            ticket: self.ticket,
        }
    }

    /// Blocks until the completion of this turn reports.
    pub(crate) fn wait(&self) -> HwStatus {
        let mut state = self.gate.state.lock();
        loop {
            if let Some(status) = self.take_result(&mut state) {
                return status;
            }
            self.gate.done.wait(&mut state);
        }
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`.
    pub(crate) fn wait_for(&self, timeout: Duration) -> Option<HwStatus> {
        let deadline = Instant::now() + timeout;
        let mut state = self.gate.state.lock();
        loop {
            if let Some(status) = self.take_result(&mut state) {
                return Some(status);
            }
            if self.gate.done.wait_until(&mut state, deadline).timed_out() {
                return self.take_result(&mut state);
            }
        }
    }

    fn take_result(&self, state: &mut GateState) -> Option<HwStatus> {
        if state.ticket == self.ticket {
            state.result.take()
        } else {
            None
        }
    }
}

/// Moved into the completion of a synchronous send.
pub(crate) struct SyncNotifier {
    gate: Arc<SyncSendGate>,
    ticket: u64,
}

impl SyncNotifier {
    pub(crate) fn notify(self, status: HwStatus) {
        let mut state = self.gate.state.lock();
        if state.ticket != self.ticket {
            debug!(
                "dropping late completion {} for sync send #{} (current #{})",
                status, self.ticket, state.ticket
            );
            return;
        }
        state.result = Some(status);
        self.gate.done.notify_all();
    }
}
