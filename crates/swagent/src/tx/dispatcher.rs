//! TxDispatcher implementation.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use swagent_hal::{
    HwError, HwStatus, PacketBuffer, PortHandle, SwitchHal, TxCompletion, TxRejected,
};

use super::packet::{OutboundPacket, TxShared};
use super::sync::{SyncNotifier, SyncSendGate};
use super::types::{TxError, TxMode, TxOutcome, TxResult};
use crate::fatal::FatalPath;
use crate::metrics::TxMetrics;

/// Dispatcher configuration.
#[derive(Debug, Clone, Default)]
pub struct TxDispatcherConfig {
    /// Upper bound on how long a synchronous send waits for its completion.
    /// `None` waits for as long as the hardware takes.
    pub sync_send_timeout: Option<Duration>,
}

/// Submits control-plane packets to the hardware and reconciles completions.
pub struct TxDispatcher {
    config: TxDispatcherConfig,
    shared: Arc<TxShared>,
    sync_gate: Arc<SyncSendGate>,
    fatal: Arc<FatalPath>,
}

impl TxDispatcher {
    pub fn new(
        config: TxDispatcherConfig,
        hal: Arc<dyn SwitchHal>,
        metrics: TxMetrics,
        fatal: Arc<FatalPath>,
    ) -> Self {
        Self {
            config,
            shared: Arc::new(TxShared { hal, metrics }),
            sync_gate: Arc::new(SyncSendGate::new()),
            fatal,
        }
    }

    pub fn config(&self) -> &TxDispatcherConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TxMetrics {
        &self.shared.metrics
    }

    /// Allocates a packet of `size` bytes from the hardware pool.
    pub fn allocate(&self, size: usize) -> TxResult<OutboundPacket> {
        match self.shared.hal.allocate(size) {
            Ok(buffer) => {
                self.shared.metrics.packets_allocated_total.inc();
                Ok(OutboundPacket::new(buffer, Arc::clone(&self.shared)))
            }
            Err(HwError::ResourceExhausted { status, context }) => {
                self.shared.metrics.alloc_errors_total.inc();
                debug!("{}: {}", context, status);
                Err(TxError::ResourceExhausted { status })
            }
            Err(e) => {
                let e = self.fatal.escalate(e);
                self.shared.metrics.send_errors_total.inc();
                error!("failed to allocate {} byte packet: {}", size, e);
                Err(TxError::Allocation(e))
            }
        }
    }

    /// Sends a packet to be switched by the hardware pipeline.
    pub fn send(&self, packet: OutboundPacket, mode: TxMode) -> TxResult<TxOutcome> {
        if packet.is_empty() {
            warn!("dropping empty {} packet", mode);
            return Err(TxError::EmptyPacket);
        }
        match mode {
            TxMode::Async => self.submit(packet, None).map(|()| TxOutcome::Queued),
            TxMode::Sync => self.send_sync(packet),
        }
    }

    /// Copies `frame` into a fresh packet and sends it on CPU queue `cos`.
    pub fn send_frame(&self, frame: &[u8], cos: u8, mode: TxMode) -> TxResult<TxOutcome> {
        if frame.is_empty() {
            return Err(TxError::EmptyPacket);
        }
        let mut packet = self.allocate(frame.len())?;
        packet.data_mut().copy_from_slice(frame);
        packet.set_cos(cos);
        self.send(packet, mode)
    }

    /// Sends a packet straight out of `port`, bypassing the pipeline.
    pub fn send_out_of_port(
        &self,
        mut packet: OutboundPacket,
        port: PortHandle,
    ) -> TxResult<TxOutcome> {
        packet.set_egress_port(port);
        self.send(packet, TxMode::Async)
    }

    fn send_sync(&self, packet: OutboundPacket) -> TxResult<TxOutcome> {
        let turn = self.sync_gate.enter();
        self.submit(packet, Some(turn.notifier()))?;

        let status = match self.config.sync_send_timeout {
            Some(timeout) => match turn.wait_for(timeout) {
                Some(status) => status,
                None => {
                    self.shared.metrics.sync_timeouts_total.inc();
                    warn!("synchronous send not completed within {:?}", timeout);
                    return Err(TxError::SyncTimeout { timeout });
                }
            },
            None => turn.wait(),
        };

        if status.is_success() {
            Ok(TxOutcome::Sent)
        } else {
            Err(TxError::CompletionFailed { status })
        }
    }

    /// Hands the packet to the hardware. No dispatcher lock is held here, so
    /// the completion may run on this thread before `transmit` returns.
    fn submit(&self, mut packet: OutboundPacket, notifier: Option<SyncNotifier>) -> TxResult<()> {
        let buffer = match packet.take_for_submit() {
            Some(buffer) => buffer,
            None => return Err(TxError::EmptyPacket),
        };

        let fatal = Arc::clone(&self.fatal);
        let on_complete: TxCompletion = Box::new(move |buffer: PacketBuffer, status: HwStatus| {
            if status.is_fatal() {
                fatal.log_fatal(
                    status,
                    &format!("packet {} completed with fatal error", buffer.handle()),
                );
            }
            if status.is_error() {
                warn!("packet {} completed with {}", buffer.handle(), status);
            }
            packet.complete(buffer, status.is_success());
            drop(packet);
            if let Some(notifier) = notifier {
                notifier.notify(status);
            }
        });

        match self.shared.hal.transmit(buffer, on_complete) {
            Ok(()) => {
                self.shared.metrics.packets_sent_total.inc();
                Ok(())
            }
            Err(TxRejected { buffer, status }) => {
                self.shared.release(buffer);
                Err(self.rejected(status))
            }
        }
    }

    fn rejected(&self, status: HwStatus) -> TxError {
        if status.is_fatal() {
            self.fatal.log_fatal(status, "failed to send packet");
        }
        let err = TxError::from_rejection(status);
        match err {
            TxError::ResourceExhausted { .. } => {
                self.shared.metrics.alloc_errors_total.inc();
                debug!("failed to send packet: {}", status);
            }
            _ => {
                self.shared.metrics.send_errors_total.inc();
                error!("failed to send packet: {}, {}", status, status.as_raw());
            }
        }
        err
    }
}
