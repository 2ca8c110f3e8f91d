//! Hardware abstraction consumed by the switch agent.
//!
//! The agent never talks to the vendor SDK directly. Everything it needs from
//! the ASIC goes through the narrow traits defined here, which keeps the
//! transmit path and the counter synchronizer testable against the in-memory
//! [`sim::SimSwitch`].
//!
//! # Architecture
//!
//! - [`types`]: type-safe hardware handles (buffers, counters, gports, ports)
//! - [`error`]: hardware status codes and the error taxonomy
//! - [`api`]: transmit, statistics and CoS queue primitives
//! - [`switch`]: the aggregate [`SwitchHal`] trait, switch events, fatal hook
//! - [`sim`]: simulated switch
//!
//! # Example
//!
//! ```
//! use swagent_hal::{HwResult, StatsApi, CounterHandle};
//! use swagent_hal::sim::SimSwitch;
//!
//! fn read_drops(hw: &dyn StatsApi, handle: CounterHandle) -> HwResult<u64> {
//!     hw.query_counter_value(handle)
//! }
//!
//! let sim = SimSwitch::new();
//! let handle = CounterHandle::from_raw(7).unwrap();
//! sim.set_counter_value(handle, 42);
//! assert_eq!(read_drops(&sim, handle).unwrap(), 42);
//! ```

pub mod api;
pub mod error;
pub mod sim;
pub mod switch;
pub mod types;

pub use api::{
    CosqApi, PacketBuffer, StatsApi, StreamType, TableUsage, TableUtilization, TxApi,
    TxCompletion, TxRejected,
};
pub use error::{check_error, log_error, HwError, HwResult, HwStatus, HwStatusExt};
pub use switch::{FatalHandler, SwitchEvent, SwitchEventKind, SwitchHal};
pub use types::{
    BufferHandle, BufferKind, CounterHandle, CounterKind, Gport, GportKind, HwObjectId,
    HwObjectKind, PortHandle, PortKind, RawHwHandle,
};
