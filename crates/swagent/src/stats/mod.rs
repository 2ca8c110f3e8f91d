//! Hardware counter synchronization.
//!
//! # Architecture
//!
//! ```text
//! config actor ──enqueue_add/remove──> PendingQueue ─┐
//!                                                    │ drained FIFO
//! config actor ──refresh(delta)──────────────────────┴─> CounterTable (RwLock, exclusive)
//!                                    │
//!                                    └─> query_table_utilization ─> HwTableStats (ArcSwap)
//!
//! stats actor ───collect()──> CounterTable (shared) ─> query_counter_value per handle
//! ```
//!
//! Removing a counter never races with reading it: `collect()` holds the
//! shared lock for its whole pass, so a counter is either read completely or
//! not visited at all.

mod types;
mod updater;

pub use types::{HwTableStats, MonotonicCounter, PendingMutation, StateDelta};
pub use updater::{CollectSummary, CounterSynchronizer, RefreshSummary};
