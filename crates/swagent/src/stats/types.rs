//! Types shared by the counter synchronizer.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use swagent_hal::{CounterHandle, TableUsage, TableUtilization};

/// Deferred change to the set of tracked counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingMutation {
    Add { handle: CounterHandle, name: String },
    Remove { handle: CounterHandle },
}

/// Switch state transition that triggered a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateDelta {
    pub old_generation: u64,
    pub new_generation: u64,
}

impl StateDelta {
    pub fn new(old_generation: u64, new_generation: u64) -> Self {
        Self {
            old_generation,
            new_generation,
        }
    }

    /// Delta from generation `n - 1` to `n`.
    pub fn to_generation(generation: u64) -> Self {
        Self::new(generation.saturating_sub(1), generation)
    }
}

#[derive(Debug, Default)]
struct Sample {
    value: u64,
    rate: f64,
    at: Option<Instant>,
    samples: u64,
}

/// A hardware counter and the rate it is moving at.
///
/// The value only goes up. A hardware read lower than the last one (counter
/// cleared or wrapped) re-bases the counter without producing a rate.
pub struct MonotonicCounter {
    name: String,
    sample: Mutex<Sample>,
}

impl MonotonicCounter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sample: Mutex::new(Sample::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> u64 {
        self.sample.lock().value
    }

    /// Per-second rate over the last two samples.
    pub fn rate(&self) -> f64 {
        self.sample.lock().rate
    }

    /// Number of hardware reads applied so far.
    pub fn samples(&self) -> u64 {
        self.sample.lock().samples
    }

    /// Applies a hardware read taken at `now`.
    pub fn update(&self, value: u64, now: Instant) {
        let mut sample = self.sample.lock();
        sample.rate = match sample.at {
            Some(prev) if value >= sample.value => {
                let elapsed = now.saturating_duration_since(prev).as_secs_f64();
                if elapsed > 0.0 {
                    (value - sample.value) as f64 / elapsed
                } else {
                    sample.rate
                }
            }
            _ => 0.0,
        };
        sample.value = value;
        sample.at = Some(now);
        sample.samples += 1;
    }
}

impl fmt::Debug for MonotonicCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sample = self.sample.lock();
        f.debug_struct("MonotonicCounter")
            .field("name", &self.name)
            .field("value", &sample.value)
            .field("rate", &sample.rate)
            .finish()
    }
}

/// Hardware table utilization at one switch state generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HwTableStats {
    pub generation: u64,
    pub collected_at: Option<DateTime<Utc>>,
    pub utilization: TableUtilization,
}

impl HwTableStats {
    pub fn new(generation: u64, utilization: TableUtilization) -> Self {
        Self {
            generation,
            collected_at: Some(Utc::now()),
            utilization,
        }
    }

    /// Returns every table with its export name.
    pub fn tables(&self) -> [(&'static str, TableUsage); 7] {
        let u = &self.utilization;
        [
            ("l3_host", u.l3_host),
            ("l3_nexthops", u.l3_nexthops),
            ("l3_ecmp_groups", u.l3_ecmp_groups),
            ("lpm_ipv4", u.lpm_ipv4),
            ("lpm_ipv6", u.lpm_ipv6),
            ("acl_entries", u.acl_entries),
            ("acl_counters", u.acl_counters),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_counter_starts_at_zero() {
        let counter = MonotonicCounter::new("acl_drop");
        assert_eq!(counter.name(), "acl_drop");
        assert_eq!(counter.value(), 0);
        assert_eq!(counter.rate(), 0.0);
        assert_eq!(counter.samples(), 0);
    }

    #[test]
    fn test_counter_rate() {
        let counter = MonotonicCounter::new("in_pkts");
        let t0 = Instant::now();
        counter.update(100, t0);
        assert_eq!(counter.rate(), 0.0);

        counter.update(300, t0 + Duration::from_secs(2));
        assert_eq!(counter.value(), 300);
        assert_eq!(counter.rate(), 100.0);
        assert_eq!(counter.samples(), 2);
    }

    #[test]
    fn test_counter_rebases_on_decrease() {
        let counter = MonotonicCounter::new("in_pkts");
        let t0 = Instant::now();
        counter.update(500, t0);
        counter.update(1500, t0 + Duration::from_secs(1));
        counter.update(10, t0 + Duration::from_secs(2));
        assert_eq!(counter.value(), 10);
        assert_eq!(counter.rate(), 0.0);
    }

    #[test]
    fn test_state_delta() {
        let delta = StateDelta::to_generation(5);
        assert_eq!(delta.old_generation, 4);
        assert_eq!(delta.new_generation, 5);
        assert_eq!(StateDelta::to_generation(0).old_generation, 0);
    }

    #[test]
    fn test_table_stats_tables() {
        let mut utilization = TableUtilization::default();
        utilization.lpm_ipv6 = TableUsage::new(256, 3);
        let stats = HwTableStats::new(1, utilization);
        assert!(stats.collected_at.is_some());
        let lpm = stats.tables().iter().find(|(n, _)| *n == "lpm_ipv6").map(|(_, u)| *u);
        assert_eq!(lpm, Some(TableUsage::new(256, 3)));
    }
}
