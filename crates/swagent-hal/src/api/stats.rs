//! Statistics API: hardware counter reads and table utilization queries.

use crate::error::HwResult;
use crate::types::CounterHandle;

/// Capacity and occupancy of one hardware table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableUsage {
    pub max: u64,
    pub used: u64,
}

impl TableUsage {
    /// Creates a usage record.
    pub const fn new(max: u64, used: u64) -> Self {
        Self { max, used }
    }

    /// Returns the number of free entries.
    pub fn free(&self) -> u64 {
        self.max.saturating_sub(self.used)
    }

    /// Returns the occupancy in percent, 0 for a zero-sized table.
    pub fn utilization_pct(&self) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            self.used as f64 * 100.0 / self.max as f64
        }
    }
}

/// Aggregate hardware table occupancy as reported by the ASIC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableUtilization {
    pub l3_host: TableUsage,
    pub l3_ipv4_host_used: u64,
    pub l3_ipv6_host_used: u64,
    pub l3_nexthops: TableUsage,
    pub l3_ecmp_groups: TableUsage,
    pub lpm_ipv4: TableUsage,
    pub lpm_ipv6: TableUsage,
    pub acl_entries: TableUsage,
    pub acl_counters: TableUsage,
}

/// Statistics primitives of the hardware layer.
pub trait StatsApi: Send + Sync {
    /// Reads the current value of a hardware counter.
    fn query_counter_value(&self, handle: CounterHandle) -> HwResult<u64>;

    /// Reads the current table occupancy of the ASIC.
    fn query_table_utilization(&self) -> HwResult<TableUtilization>;
}
