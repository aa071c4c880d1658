use vise::{Counter, Gauge, LabeledFamily, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "l1_gas_oracle")]
pub(crate) struct GasOracleMetrics {
    /// Fee history responses that did not have the requested shape, by network family.
    #[metrics(labels = ["network"])]
    pub shape_violations: LabeledFamily<&'static str, Counter>,
    /// Entries added to fee history series to reach the requested length.
    pub padded_entries: Counter,
    /// Entries dropped from fee history series that were longer than requested.
    pub truncated_entries: Counter,
    /// Blob fee series dropped because the network doesn't support blobs.
    pub dropped_blob_series: Counter,
    /// Base fees above the profile ceiling.
    pub clamped_base_fees: Counter,
    /// Re-pricings that could not raise the priority fee because of the profile ceiling.
    pub priority_fee_ceiling_hits: Counter,
    /// Recommendations made while the sampled base fee was above the congestion threshold.
    pub congestion_boosts: Counter,

    pub recommended_base_fee_per_gas: Gauge<u64>,
    pub recommended_priority_fee_per_gas: Gauge<u64>,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<GasOracleMetrics> = vise::Global::new();
