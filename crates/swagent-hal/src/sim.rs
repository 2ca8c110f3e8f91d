//! Simulated switch.
//!
//! `SimSwitch` implements every hardware API in memory. The agent runs on it
//! in simulation mode, and tests use its knobs to inject failures and to
//! control when and on which thread transmit completions fire.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use log::debug;
use parking_lot::Mutex;

use crate::api::{
    CosqApi, PacketBuffer, StatsApi, StreamType, TableUtilization, TxApi, TxCompletion,
    TxRejected,
};
use crate::error::{HwError, HwResult, HwStatus};
use crate::switch::SwitchHal;
use crate::types::{BufferHandle, CounterHandle, Gport, PortHandle};

const GPORT_BASE: u64 = 0x2400_0000;

/// Where and when transmit completions run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Inside `transmit`, on the submitting thread.
    Inline,
    /// On a freshly spawned thread.
    Threaded,
    /// Only when the test calls [`SimSwitch::complete_next`] or [`SimSwitch::complete`].
    Manual,
}

/// A packet the simulated ASIC accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmittedPacket {
    pub buffer: BufferHandle,
    pub bytes: Vec<u8>,
    pub cos: u8,
    pub egress_port: Option<PortHandle>,
}

/// In-memory switch implementing [`SwitchHal`].
pub struct SimSwitch {
    unit: u32,
    completion_mode: CompletionMode,
    cos_supported: bool,
    cpu_mc_queues: u8,
    next_buffer: AtomicU64,
    live_buffers: Mutex<HashSet<BufferHandle>>,
    invalid_frees: AtomicU64,
    alloc_failure: Mutex<Option<HwStatus>>,
    transmit_failures: Mutex<VecDeque<HwStatus>>,
    completion_status: Mutex<HwStatus>,
    transmitted: Mutex<Vec<TransmittedPacket>>,
    in_flight: Mutex<VecDeque<(PacketBuffer, TxCompletion)>>,
    counters: Mutex<HashMap<CounterHandle, u64>>,
    table_utilization: Mutex<TableUtilization>,
    table_query_failure: Mutex<Option<HwStatus>>,
}

impl SimSwitch {
    /// Creates a simulated switch completing transmissions inline.
    pub fn new() -> Self {
        Self {
            unit: 0,
            completion_mode: CompletionMode::Inline,
            cos_supported: true,
            cpu_mc_queues: 10,
            next_buffer: AtomicU64::new(1),
            live_buffers: Mutex::new(HashSet::new()),
            invalid_frees: AtomicU64::new(0),
            alloc_failure: Mutex::new(None),
            transmit_failures: Mutex::new(VecDeque::new()),
            completion_status: Mutex::new(HwStatus::Success),
            transmitted: Mutex::new(Vec::new()),
            in_flight: Mutex::new(VecDeque::new()),
            counters: Mutex::new(HashMap::new()),
            table_utilization: Mutex::new(TableUtilization::default()),
            table_query_failure: Mutex::new(None),
        }
    }

    pub fn with_unit(mut self, unit: u32) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_completion_mode(mut self, mode: CompletionMode) -> Self {
        self.completion_mode = mode;
        self
    }

    pub fn with_cos_supported(mut self, supported: bool) -> Self {
        self.cos_supported = supported;
        self
    }

    pub fn with_cpu_queues(mut self, queues: u8) -> Self {
        self.cpu_mc_queues = queues;
        self
    }

    /// Makes every allocation fail with `status` until cleared with `None`.
    pub fn set_alloc_failure(&self, status: Option<HwStatus>) {
        *self.alloc_failure.lock() = status;
    }

    /// Rejects the next transmit with `status`. Calls queue up.
    pub fn fail_next_transmit(&self, status: HwStatus) {
        self.transmit_failures.lock().push_back(status);
    }

    /// Sets the status delivered to subsequent completions.
    pub fn set_completion_status(&self, status: HwStatus) {
        *self.completion_status.lock() = status;
    }

    pub fn set_counter_value(&self, handle: CounterHandle, value: u64) {
        self.counters.lock().insert(handle, value);
    }

    pub fn set_table_utilization(&self, utilization: TableUtilization) {
        *self.table_utilization.lock() = utilization;
    }

    /// Makes table queries fail with `status` until cleared with `None`.
    pub fn set_table_query_failure(&self, status: Option<HwStatus>) {
        *self.table_query_failure.lock() = status;
    }

    /// Number of buffers allocated and not yet freed.
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.lock().len()
    }

    /// Number of frees of buffers that were not live.
    pub fn invalid_frees(&self) -> u64 {
        self.invalid_frees.load(Ordering::Relaxed)
    }

    /// Packets accepted for transmission so far.
    pub fn transmitted(&self) -> Vec<TransmittedPacket> {
        self.transmitted.lock().clone()
    }

    /// Completions waiting to be fired in [`CompletionMode::Manual`].
    pub fn pending_completions(&self) -> Vec<BufferHandle> {
        self.in_flight.lock().iter().map(|(buf, _)| buf.handle()).collect()
    }

    /// Fires the oldest pending completion. Returns false if none is pending.
    pub fn complete_next(&self) -> bool {
        let next = self.in_flight.lock().pop_front();
        match next {
            Some((buffer, done)) => {
                let status = *self.completion_status.lock();
                done(buffer, status);
                true
            }
            None => false,
        }
    }

    /// Fires the pending completion of a specific buffer.
    pub fn complete(&self, handle: BufferHandle) -> bool {
        let entry = {
            let mut in_flight = self.in_flight.lock();
            let pos = in_flight.iter().position(|(buf, _)| buf.handle() == handle);
            pos.and_then(|pos| in_flight.remove(pos))
        };
        match entry {
            Some((buffer, done)) => {
                let status = *self.completion_status.lock();
                done(buffer, status);
                true
            }
            None => false,
        }
    }

    /// Fires every pending completion, returning how many ran.
    pub fn complete_all(&self) -> usize {
        let mut fired = 0;
        while self.complete_next() {
            fired += 1;
        }
        fired
    }
}

impl Default for SimSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl TxApi for SimSwitch {
    fn allocate(&self, size: usize) -> HwResult<PacketBuffer> {
        if let Some(status) = *self.alloc_failure.lock() {
            return Err(HwError::from_status_with_context(
                status,
                format!("failed to allocate {} byte packet", size),
            ));
        }
        let raw = self.next_buffer.fetch_add(1, Ordering::Relaxed);
        let handle = BufferHandle::from_raw_unchecked(raw);
        self.live_buffers.lock().insert(handle);
        Ok(PacketBuffer::new(handle, size))
    }

    fn free(&self, buffer: PacketBuffer) -> HwStatus {
        if self.live_buffers.lock().remove(&buffer.handle()) {
            HwStatus::Success
        } else {
            self.invalid_frees.fetch_add(1, Ordering::Relaxed);
            HwStatus::ItemNotFound
        }
    }

    fn transmit(&self, buffer: PacketBuffer, on_complete: TxCompletion) -> Result<(), TxRejected> {
        if let Some(status) = self.transmit_failures.lock().pop_front() {
            return Err(TxRejected { buffer, status });
        }

        self.transmitted.lock().push(TransmittedPacket {
            buffer: buffer.handle(),
            bytes: buffer.data().to_vec(),
            cos: buffer.cos(),
            egress_port: buffer.egress_port(),
        });
        debug!(
            "unit {}: accepted packet {} ({} bytes, cos {})",
            self.unit,
            buffer.handle(),
            buffer.len(),
            buffer.cos()
        );

        let status = *self.completion_status.lock();
        match self.completion_mode {
            CompletionMode::Inline => on_complete(buffer, status),
            CompletionMode::Threaded => {
                thread::spawn(move || on_complete(buffer, status));
            }
            CompletionMode::Manual => self.in_flight.lock().push_back((buffer, on_complete)),
        }
        Ok(())
    }
}

impl StatsApi for SimSwitch {
    fn query_counter_value(&self, handle: CounterHandle) -> HwResult<u64> {
        self.counters
            .lock()
            .get(&handle)
            .copied()
            .ok_or_else(|| HwError::not_found(format!("counter {}", handle)))
    }

    fn query_table_utilization(&self) -> HwResult<TableUtilization> {
        if let Some(status) = *self.table_query_failure.lock() {
            return Err(HwError::from_status_with_context(
                status,
                "failed to query table utilization",
            ));
        }
        Ok(*self.table_utilization.lock())
    }
}

impl CosqApi for SimSwitch {
    fn is_cos_supported(&self) -> bool {
        self.cos_supported
    }

    fn num_cpu_queues(&self, stream: StreamType) -> u8 {
        match stream {
            StreamType::Multicast => self.cpu_mc_queues,
            _ => 0,
        }
    }

    fn resolve_gport(&self, stream: StreamType, queue: u8) -> HwResult<Gport> {
        if !self.cos_supported {
            return Err(HwError::unsupported("platform does not support cosq"));
        }
        if stream != StreamType::Multicast {
            return Err(HwError::unsupported(format!(
                "CPU port has no {} queues",
                stream
            )));
        }
        if queue >= self.cpu_mc_queues {
            return Err(HwError::invalid_parameter(format!(
                "CPU queue {} out of range (max {})",
                queue, self.cpu_mc_queues
            )));
        }
        Ok(Gport::from_raw_unchecked(GPORT_BASE | u64::from(queue)))
    }
}

impl SwitchHal for SimSwitch {
    fn unit(&self) -> u32 {
        self.unit
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_alloc_and_free_tracking() {
        let sim = SimSwitch::new();
        let buf = sim.allocate(64).unwrap();
        assert_eq!(sim.live_buffers(), 1);
        assert_eq!(sim.free(buf), HwStatus::Success);
        assert_eq!(sim.live_buffers(), 0);
        assert_eq!(sim.invalid_frees(), 0);
    }

    #[test]
    fn test_injected_transmit_failure_returns_buffer() {
        let sim = SimSwitch::new();
        sim.fail_next_transmit(HwStatus::NoMemory);
        let buf = sim.allocate(64).unwrap();
        let handle = buf.handle();

        let rejected = sim
            .transmit(
                buf,
                Box::new(|_: PacketBuffer, _: HwStatus| panic!("must not run")),
            )
            .unwrap_err();
        assert_eq!(rejected.status, HwStatus::NoMemory);
        assert_eq!(rejected.buffer.handle(), handle);
        assert!(sim.transmitted().is_empty());
        sim.free(rejected.buffer);
    }

    #[test]
    fn test_manual_completion() {
        let sim = SimSwitch::new().with_completion_mode(CompletionMode::Manual);
        let fired = Arc::new(AtomicU64::new(0));

        let buf = sim.allocate(16).unwrap();
        let counter = Arc::clone(&fired);
        sim.transmit(
            buf,
            Box::new(move |_: PacketBuffer, status: HwStatus| {
                assert_eq!(status, HwStatus::Success);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        assert_eq!(sim.pending_completions().len(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(sim.complete_next());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!sim.complete_next());
    }

    #[test]
    fn test_counter_query() {
        let sim = SimSwitch::new();
        let handle = CounterHandle::from_raw(7).unwrap();
        assert!(sim.query_counter_value(handle).is_err());
        sim.set_counter_value(handle, 42);
        assert_eq!(sim.query_counter_value(handle).unwrap(), 42);
    }

    #[test]
    fn test_gport_resolution() {
        let sim = SimSwitch::new().with_cpu_queues(4);
        assert!(sim.resolve_gport(StreamType::Multicast, 3).is_ok());
        assert!(matches!(
            sim.resolve_gport(StreamType::Unicast, 0),
            Err(HwError::Unsupported { .. })
        ));
        assert!(sim.resolve_gport(StreamType::Multicast, 4).is_err());

        let no_cos = SimSwitch::new().with_cos_supported(false);
        assert!(matches!(
            no_cos.resolve_gport(StreamType::Multicast, 0),
            Err(HwError::Unsupported { .. })
        ));
    }
}
