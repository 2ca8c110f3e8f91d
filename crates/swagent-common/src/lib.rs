//! Shared building blocks for the switch agent.
//!
//! - [`SyncMap`]: map that never creates entries implicitly
//! - [`PendingQueue`]: FIFO of deferred work guarded by its own lock
//! - [`Snapshot`]: wholesale-replaced value with lock-free reads
//! - [`Actor`] and [`ShutdownSignal`]: long-running daemon tasks
//!
//! # Architecture
//!
//! The agent splits its work between actors that never share a lock across
//! an await point. State crossing actor boundaries goes through one of the
//! containers above:
//!
//! 1. A producer pushes deferred mutations onto a `PendingQueue`
//! 2. The owner drains the queue and applies it to a `SyncMap` under an
//!    exclusive lock
//! 3. Derived aggregates are rebuilt off to the side and published through a
//!    `Snapshot`, so readers never wait on the writer

mod actor;
mod pending;
mod snapshot;
mod sync_map;

pub use actor::{shutdown_channel, Actor, ShutdownSignal, ShutdownTrigger};
pub use pending::PendingQueue;
pub use snapshot::Snapshot;
pub use sync_map::{SyncMap, SyncMapError};
