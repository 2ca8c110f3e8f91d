//! Control-plane packet transmit.
//!
//! The [`TxDispatcher`] owns every outbound packet from allocation until the
//! hardware reports completion, then releases the buffer exactly once.
//!
//! # Architecture
//!
//! ```text
//! caller ──send(packet, mode)──> TxDispatcher ──transmit(buffer, completion)──> TxApi
//!                                     │                                           │
//!                                     │ Sync: wait on SyncSendGate                │
//!                                     │<────────── completion(buffer, status) ────┘
//!                                     ▼            (any thread, maybe inline)
//!                             metrics + buffer freed
//! ```
//!
//! Asynchronous sends return as soon as the hardware accepted the packet.
//! Synchronous sends are serialized and block until their own completion
//! fires, optionally bounded by a timeout.

mod dispatcher;
mod packet;
mod sync;
mod types;

pub use dispatcher::{TxDispatcher, TxDispatcherConfig};
pub use packet::OutboundPacket;
pub use types::{TxError, TxMode, TxOutcome, TxResult};
