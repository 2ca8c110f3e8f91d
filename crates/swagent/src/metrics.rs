//! Prometheus metrics for the switch agent.
//!
//! One registry owned by [`AgentMetrics`]; each component gets a cloned
//! handle to its own group of metrics so it never touches the registry.

use std::sync::Arc;

use prometheus::{
    Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};
use swagent_hal::TableUsage;

/// Packet transmit metrics.
#[derive(Clone)]
pub struct TxMetrics {
    pub packets_allocated_total: Counter,
    pub packets_freed_total: Counter,
    pub packets_sent_total: Counter,
    pub send_errors_total: Counter,
    pub alloc_errors_total: Counter,
    pub sync_timeouts_total: Counter,
    pub completions_total: CounterVec,
    pub completion_latency_seconds: Histogram,
}

impl TxMetrics {
    fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let packets_allocated_total = Counter::with_opts(Opts::new(
            "swagent_tx_packets_allocated_total",
            "Total number of packet buffers allocated for transmit",
        ))?;
        registry.register(Box::new(packets_allocated_total.clone()))?;

        let packets_freed_total = Counter::with_opts(Opts::new(
            "swagent_tx_packets_freed_total",
            "Total number of packet buffers returned to the pool",
        ))?;
        registry.register(Box::new(packets_freed_total.clone()))?;

        let packets_sent_total = Counter::with_opts(Opts::new(
            "swagent_tx_packets_sent_total",
            "Total number of packets accepted by the hardware",
        ))?;
        registry.register(Box::new(packets_sent_total.clone()))?;

        let send_errors_total = Counter::with_opts(Opts::new(
            "swagent_tx_send_errors_total",
            "Total number of packets the hardware refused",
        ))?;
        registry.register(Box::new(send_errors_total.clone()))?;

        let alloc_errors_total = Counter::with_opts(Opts::new(
            "swagent_tx_alloc_errors_total",
            "Total number of transmit attempts failed on packet buffer exhaustion",
        ))?;
        registry.register(Box::new(alloc_errors_total.clone()))?;

        let sync_timeouts_total = Counter::with_opts(Opts::new(
            "swagent_tx_sync_timeouts_total",
            "Total number of synchronous sends that gave up waiting for completion",
        ))?;
        registry.register(Box::new(sync_timeouts_total.clone()))?;

        let completions_total = CounterVec::new(
            Opts::new(
                "swagent_tx_completions_total",
                "Total number of transmit completions by result",
            ),
            &["result"],
        )?;
        registry.register(Box::new(completions_total.clone()))?;

        let completion_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "swagent_tx_completion_latency_seconds",
                "Time from submission to hardware completion in seconds",
            )
            .buckets(vec![
                0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(completion_latency_seconds.clone()))?;

        Ok(Self {
            packets_allocated_total,
            packets_freed_total,
            packets_sent_total,
            send_errors_total,
            alloc_errors_total,
            sync_timeouts_total,
            completions_total,
            completion_latency_seconds,
        })
    }

    /// Record a completion and the time it took.
    pub fn record_completion(&self, success: bool, latency_secs: f64) {
        let result = if success { "ok" } else { "failed" };
        self.completions_total.with_label_values(&[result]).inc();
        self.completion_latency_seconds.observe(latency_secs);
    }

    /// Returns the number of completions with the given result label.
    pub fn completions(&self, result: &str) -> f64 {
        self.completions_total.with_label_values(&[result]).get()
    }
}

/// Counter synchronizer metrics.
#[derive(Clone)]
pub struct SyncMetrics {
    pub counters_tracked: Gauge,
    pub pending_mutations: Gauge,
    pub refreshes_total: Counter,
    pub collections_total: Counter,
    pub collect_errors_total: Counter,
    pub table_query_errors_total: Counter,
    pub hw_table_used: GaugeVec,
    pub hw_table_max: GaugeVec,
}

impl SyncMetrics {
    fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let counters_tracked = Gauge::with_opts(Opts::new(
            "swagent_counters_tracked",
            "Number of hardware counters currently tracked",
        ))?;
        registry.register(Box::new(counters_tracked.clone()))?;

        let pending_mutations = Gauge::with_opts(Opts::new(
            "swagent_counter_pending_mutations",
            "Counter add/remove requests waiting for the next refresh",
        ))?;
        registry.register(Box::new(pending_mutations.clone()))?;

        let refreshes_total = Counter::with_opts(Opts::new(
            "swagent_counter_refreshes_total",
            "Total number of counter table refreshes",
        ))?;
        registry.register(Box::new(refreshes_total.clone()))?;

        let collections_total = Counter::with_opts(Opts::new(
            "swagent_counter_collections_total",
            "Total number of counter collection passes",
        ))?;
        registry.register(Box::new(collections_total.clone()))?;

        let collect_errors_total = Counter::with_opts(Opts::new(
            "swagent_counter_collect_errors_total",
            "Total number of failed hardware counter reads",
        ))?;
        registry.register(Box::new(collect_errors_total.clone()))?;

        let table_query_errors_total = Counter::with_opts(Opts::new(
            "swagent_hw_table_query_errors_total",
            "Total number of failed hardware table utilization queries",
        ))?;
        registry.register(Box::new(table_query_errors_total.clone()))?;

        let hw_table_used = GaugeVec::new(
            Opts::new("swagent_hw_table_used", "Used entries per hardware table"),
            &["table"],
        )?;
        registry.register(Box::new(hw_table_used.clone()))?;

        let hw_table_max = GaugeVec::new(
            Opts::new("swagent_hw_table_max", "Capacity per hardware table"),
            &["table"],
        )?;
        registry.register(Box::new(hw_table_max.clone()))?;

        Ok(Self {
            counters_tracked,
            pending_mutations,
            refreshes_total,
            collections_total,
            collect_errors_total,
            table_query_errors_total,
            hw_table_used,
            hw_table_max,
        })
    }

    /// Update the gauges of one hardware table.
    pub fn set_table_usage(&self, table: &str, usage: TableUsage) {
        self.hw_table_used
            .with_label_values(&[table])
            .set(usage.used as f64);
        self.hw_table_max
            .with_label_values(&[table])
            .set(usage.max as f64);
    }

    pub fn table_used(&self, table: &str) -> f64 {
        self.hw_table_used.with_label_values(&[table]).get()
    }
}

/// Switch event metrics.
#[derive(Clone)]
pub struct EventMetrics {
    pub switch_events_total: CounterVec,
}

impl EventMetrics {
    fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let switch_events_total = CounterVec::new(
            Opts::new(
                "swagent_switch_events_total",
                "Total number of non-fatal hardware events by alarm",
            ),
            &["alarm"],
        )?;
        registry.register(Box::new(switch_events_total.clone()))?;

        Ok(Self {
            switch_events_total,
        })
    }

    pub fn record_event(&self, alarm: &str) {
        self.switch_events_total.with_label_values(&[alarm]).inc();
    }

    pub fn events(&self, alarm: &str) -> f64 {
        self.switch_events_total.with_label_values(&[alarm]).get()
    }
}

/// All agent metrics and the registry they are exported from.
#[derive(Clone)]
pub struct AgentMetrics {
    pub tx: TxMetrics,
    pub sync: SyncMetrics,
    pub events: EventMetrics,
    pub registry: Arc<Registry>,
}

impl AgentMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let tx = TxMetrics::register(&registry)?;
        let sync = SyncMetrics::register(&registry)?;
        let events = EventMetrics::register(&registry)?;

        Ok(Self {
            tx,
            sync,
            events,
            registry: Arc::new(registry),
        })
    }

    /// Renders every registered metric in the text exposition format.
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
