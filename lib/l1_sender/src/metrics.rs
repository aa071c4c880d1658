use std::time::Duration;
use vise::{Buckets, Counter, Gauge, Histogram, LabeledFamily, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "l1_tx_tracker")]
pub(crate) struct TrackerMetrics {
    /// Tracked transactions by state.
    #[metrics(labels = ["state"])]
    pub in_flight: LabeledFamily<&'static str, Gauge<usize>>,
    /// Transactions that left the tracker, by final state.
    #[metrics(labels = ["state"])]
    pub finalized: LabeledFamily<&'static str, Counter>,
    pub broadcasts: Counter,
    pub rejected_broadcasts: Counter,
    /// Submitted transactions that were not mined within the stuck timeout.
    pub confirmation_timeouts: Counter,
    pub fee_history_failures: Counter,
    pub reorged_out: Counter,
    #[metrics(buckets = Buckets::LATENCIES, labels = ["method"])]
    pub rpc_latency: LabeledFamily<&'static str, Histogram<Duration>>,
    /// Broadcasts needed to get a transaction confirmed.
    #[metrics(buckets = Buckets::linear(1.0..=10.0, 1.0))]
    pub attempts_per_confirmation: Histogram<usize>,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<TrackerMetrics> = vise::Global::new();
