use crate::client::L1Client;
use crate::metrics::METRICS;
use alloy::eips::BlockNumberOrTag;
use anyhow::Context;
use l1_adapter_gas_oracle::{FeeHistorySample, FeeHistoryShapeViolation, normalize};
use l1_adapter_network::NetworkProfile;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub(crate) enum PricingError {
    /// Not retried: the node is expected to return well-formed history on this network.
    #[error(transparent)]
    ShapeViolation(#[from] FeeHistoryShapeViolation),
    #[error("fee history unavailable: {0:#}")]
    Unavailable(anyhow::Error),
}

/// Runs a single L1 RPC call, bounded by `timeout`.
pub(crate) async fn timed_rpc<T>(
    timeout: Duration,
    method: &'static str,
    call: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    let latency = METRICS.rpc_latency[&method].start();
    let result = tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| anyhow::anyhow!("`{method}` timed out after {timeout:?}"))?
        .with_context(|| format!("`{method}` failed"));
    latency.observe();
    result
}

/// Fetches and normalizes fee history for the latest `block_count` blocks.
pub(crate) async fn fetch_sample(
    client: &dyn L1Client,
    profile: &NetworkProfile,
    block_count: u32,
    reward_percentile: f64,
    timeout: Duration,
) -> Result<FeeHistorySample, PricingError> {
    let raw = timed_rpc(
        timeout,
        "fee_history",
        client.raw_fee_history(block_count.into(), BlockNumberOrTag::Latest, reward_percentile),
    )
    .await
    .map_err(PricingError::Unavailable)?;
    Ok(normalize(raw, block_count, profile)?)
}
