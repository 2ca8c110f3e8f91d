//! Outbound packets.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::warn;
use swagent_hal::{log_error, PacketBuffer, PortHandle, SwitchHal};

use crate::metrics::TxMetrics;

/// State every packet of one dispatcher needs to release its buffer.
pub(crate) struct TxShared {
    pub(crate) hal: Arc<dyn SwitchHal>,
    pub(crate) metrics: TxMetrics,
}

impl TxShared {
    /// Returns a buffer to the hardware pool and counts it.
    pub(crate) fn release(&self, buffer: PacketBuffer) {
        let handle = buffer.handle();
        let status = self.hal.free(buffer);
        self.metrics.packets_freed_total.inc();
        log_error(status, &format!("failed to free packet buffer {}", handle));
    }
}

/// A control-plane packet on its way to a CPU egress queue.
///
/// Holds the hardware buffer until the packet is submitted. A packet dropped
/// before submission, after a rejected submission, or after its completion
/// has run returns the buffer to the pool exactly once.
pub struct OutboundPacket {
    buffer: Option<PacketBuffer>,
    queued_at: Option<Instant>,
    shared: Arc<TxShared>,
}

impl OutboundPacket {
    pub(crate) fn new(buffer: PacketBuffer, shared: Arc<TxShared>) -> Self {
        Self {
            buffer: Some(buffer),
            queued_at: None,
            shared,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.as_ref().map_or(0, PacketBuffer::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data(&self) -> &[u8] {
        match self.buffer.as_ref() {
            Some(buffer) => buffer.data(),
            None => &[],
        }
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        match self.buffer.as_mut() {
            Some(buffer) => buffer.data_mut(),
            None => &mut [],
        }
    }

    /// Truncates the packet to `len` bytes.
    ///
    /// Lengths beyond the allocated size are refused and logged.
    pub fn truncate(&mut self, len: usize) {
        if let Some(buffer) = self.buffer.as_mut() {
            if let Err(e) = buffer.set_len(len) {
                warn!("cannot resize packet: {}", e);
            }
        }
    }

    pub fn cos(&self) -> u8 {
        self.buffer.as_ref().map_or(0, PacketBuffer::cos)
    }

    /// Selects the CPU egress queue the packet is sent from.
    pub fn set_cos(&mut self, cos: u8) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.set_cos(cos);
        }
    }

    pub fn egress_port(&self) -> Option<PortHandle> {
        self.buffer.as_ref().and_then(PacketBuffer::egress_port)
    }

    pub(crate) fn set_egress_port(&mut self, port: PortHandle) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.set_egress_port(Some(port));
        }
    }

    /// Hands the buffer to the hardware and starts the latency clock.
    pub(crate) fn take_for_submit(&mut self) -> Option<PacketBuffer> {
        self.queued_at = Some(Instant::now());
        self.buffer.take()
    }

    /// Takes the buffer back from a completion and records its metrics.
    pub(crate) fn complete(&mut self, buffer: PacketBuffer, success: bool) {
        let latency = self
            .queued_at
            .map_or(0.0, |queued_at| queued_at.elapsed().as_secs_f64());
        self.shared.metrics.record_completion(success, latency);
        self.buffer = Some(buffer);
    }
}

impl Drop for OutboundPacket {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.shared.release(buffer);
        }
    }
}

impl fmt::Debug for OutboundPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundPacket")
            .field("buffer", &self.buffer)
            .field("queued_at", &self.queued_at)
            .finish()
    }
}
