//! Packet transmit API.
//!
//! Packet buffers live in hardware-owned DMA memory. A [`PacketBuffer`] is the
//! Rust-side owning token for one such buffer: whoever holds it is the only
//! party allowed to touch the memory, and it must eventually go back to
//! [`TxApi::free`].
//!
//! Ownership during transmission is handed to the hardware layer by value. On
//! completion the hardware moves the buffer back into the registered
//! [`TxCompletion`]; on rejection it comes back inside [`TxRejected`] and the
//! completion is dropped without running.

use std::fmt;

use crate::error::{HwError, HwResult, HwStatus};
use crate::types::{BufferHandle, PortHandle};

/// Continuation run exactly once when the hardware finishes a transmission.
///
/// May run on any thread, including the thread that called
/// [`TxApi::transmit`] (before `transmit` returns).
pub type TxCompletion = Box<dyn FnOnce(PacketBuffer, HwStatus) + Send + 'static>;

/// A packet buffer allocated from the hardware packet pool.
pub struct PacketBuffer {
    handle: BufferHandle,
    data: Box<[u8]>,
    len: usize,
    cos: u8,
    egress_port: Option<PortHandle>,
}

impl PacketBuffer {
    /// Wraps freshly allocated packet memory.
    ///
    /// Only hardware implementations mint buffers; the whole capacity is
    /// initially part of the packet.
    pub fn new(handle: BufferHandle, size: usize) -> Self {
        Self {
            handle,
            data: vec![0u8; size].into_boxed_slice(),
            len: size,
            cos: 0,
            egress_port: None,
        }
    }

    /// Returns the hardware handle of this buffer.
    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Returns the packet length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the packet carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the allocated size.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the packet bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Returns the packet bytes for writing.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }

    /// Shrinks or grows the packet within the allocated size.
    pub fn set_len(&mut self, len: usize) -> HwResult<()> {
        if len > self.data.len() {
            return Err(HwError::invalid_parameter(format!(
                "packet length {} exceeds buffer size {}",
                len,
                self.data.len()
            )));
        }
        self.len = len;
        Ok(())
    }

    /// Returns the class of service the packet is queued with.
    pub fn cos(&self) -> u8 {
        self.cos
    }

    /// Sets the class of service (CPU egress queue) for the packet.
    pub fn set_cos(&mut self, cos: u8) {
        self.cos = cos;
    }

    /// Returns the port the packet is forced out of, if any.
    pub fn egress_port(&self) -> Option<PortHandle> {
        self.egress_port
    }

    /// Forces the packet out of a specific port instead of switching it.
    pub fn set_egress_port(&mut self, port: Option<PortHandle>) {
        self.egress_port = port;
    }
}

impl fmt::Debug for PacketBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketBuffer")
            .field("handle", &self.handle)
            .field("len", &self.len)
            .field("capacity", &self.data.len())
            .field("cos", &self.cos)
            .field("egress_port", &self.egress_port)
            .finish()
    }
}

/// A submission the hardware refused. The buffer comes back to the caller.
#[derive(Debug)]
pub struct TxRejected {
    pub buffer: PacketBuffer,
    pub status: HwStatus,
}

/// Transmit primitives of the hardware layer.
pub trait TxApi: Send + Sync {
    /// Allocates a packet buffer of `size` bytes from the packet pool.
    fn allocate(&self, size: usize) -> HwResult<PacketBuffer>;

    /// Returns a buffer to the packet pool.
    fn free(&self, buffer: PacketBuffer) -> HwStatus;

    /// Submits a packet for transmission.
    ///
    /// On `Ok(())` the hardware owns the buffer and will run `on_complete`
    /// exactly once. On `Err` the completion has been dropped without running.
    fn transmit(&self, buffer: PacketBuffer, on_complete: TxCompletion) -> Result<(), TxRejected>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(size: usize) -> PacketBuffer {
        PacketBuffer::new(BufferHandle::from_raw_unchecked(1), size)
    }

    #[test]
    fn test_new_buffer_spans_capacity() {
        let buf = buffer(64);
        assert_eq!(buf.len(), 64);
        assert_eq!(buf.capacity(), 64);
        assert!(!buf.is_empty());
        assert_eq!(buf.cos(), 0);
        assert!(buf.egress_port().is_none());
    }

    #[test]
    fn test_set_len_bounds() {
        let mut buf = buffer(64);
        buf.set_len(14).unwrap();
        assert_eq!(buf.data().len(), 14);
        assert!(buf.set_len(65).is_err());
        assert_eq!(buf.len(), 14);
    }

    #[test]
    fn test_data_mut_writes() {
        let mut buf = buffer(4);
        buf.data_mut().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(buf.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_debug_hides_payload() {
        let mut buf = buffer(8);
        buf.set_cos(7);
        let debug = format!("{:?}", buf);
        assert!(debug.contains("cos: 7"));
        assert!(!debug.contains("data"));
    }
}
