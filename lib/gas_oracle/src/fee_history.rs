use crate::metrics::METRICS;
use alloy::rpc::types::FeeHistory;
use l1_adapter_network::NetworkProfile;
use serde::{Deserialize, Serialize};

/// Fee history as returned by the L1 node, possibly malformed.
///
/// `reward_percentiles` holds one value per block: the reward at the single percentile that was
/// requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFeeHistoryResponse {
    pub oldest_block: u64,
    pub base_fee_per_gas: Vec<u128>,
    pub reward_percentiles: Vec<u128>,
    pub base_fee_per_blob_gas: Option<Vec<u128>>,
}

impl From<FeeHistory> for RawFeeHistoryResponse {
    fn from(history: FeeHistory) -> Self {
        let reward_percentiles = history
            .reward
            .unwrap_or_default()
            .into_iter()
            .map(|rewards| rewards.first().copied().unwrap_or_default())
            .collect();
        // Nodes that don't know about blobs omit the field entirely.
        let base_fee_per_blob_gas =
            (!history.base_fee_per_blob_gas.is_empty()).then_some(history.base_fee_per_blob_gas);

        Self {
            oldest_block: history.oldest_block,
            base_fee_per_gas: history.base_fee_per_gas,
            reward_percentiles,
            base_fee_per_blob_gas,
        }
    }
}

/// Fee history with guaranteed shape.
///
/// For `n` requested blocks: `base_fee_per_gas` has `n + 1` entries (the last one is the base fee
/// of the next block), `reward_percentiles` has `n` entries, and `base_fee_per_blob_gas` is either
/// absent (network without blobs) or has `n + 1` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeHistorySample {
    pub oldest_block: u64,
    pub base_fee_per_gas: Vec<u128>,
    pub reward_percentiles: Vec<u128>,
    pub base_fee_per_blob_gas: Option<Vec<u128>>,
}

impl FeeHistorySample {
    /// Number of historical blocks covered by the sample.
    pub fn block_count(&self) -> u64 {
        self.reward_percentiles.len() as u64
    }

    /// The block right after the newest sampled one, i.e. the block the next tx would land in.
    pub fn next_block(&self) -> u64 {
        self.oldest_block.saturating_add(self.block_count())
    }

    /// Base fee reported for the next block, if any.
    pub fn next_base_fee(&self) -> Option<u128> {
        self.base_fee_per_gas.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "L1 chain {chain_id} returned malformed fee history for {requested_blocks} blocks: \
     got {base_fee_len} base fees and {reward_len} rewards"
)]
pub struct FeeHistoryShapeViolation {
    pub chain_id: u64,
    pub requested_blocks: u32,
    pub base_fee_len: usize,
    pub reward_len: usize,
}

/// Repairs a fee history response so that it has exactly the requested shape.
///
/// Networks that are known to truncate fee history (everything but Ethereum) get their arrays
/// padded: base fees by repeating the last known value (or the profile target if there is none),
/// rewards with zeros. A malformed response from an Ethereum network indicates a broken node or
/// client, so it is reported instead of being papered over.
pub fn normalize(
    raw: RawFeeHistoryResponse,
    requested_blocks: u32,
    profile: &NetworkProfile,
) -> Result<FeeHistorySample, FeeHistoryShapeViolation> {
    let base_fee_len = requested_blocks as usize + 1;
    let reward_len = requested_blocks as usize;

    let base_fee_per_blob_gas = match raw.base_fee_per_blob_gas {
        Some(series) if profile.supports_blob_fee => Some(fit_repeating_last(series, base_fee_len, 0)),
        Some(_) => {
            tracing::debug!(
                chain_id = profile.chain_id,
                "dropping blob fee series for network without blob support"
            );
            METRICS.dropped_blob_series.inc();
            None
        }
        None if profile.supports_blob_fee => Some(vec![0; base_fee_len]),
        None => None,
    };

    let shape_ok =
        raw.base_fee_per_gas.len() == base_fee_len && raw.reward_percentiles.len() == reward_len;
    if shape_ok {
        return Ok(FeeHistorySample {
            oldest_block: raw.oldest_block,
            base_fee_per_gas: raw.base_fee_per_gas,
            reward_percentiles: raw.reward_percentiles,
            base_fee_per_blob_gas,
        });
    }

    METRICS.shape_violations[&profile.family.as_str()].inc();
    if profile.family.is_ethereum() {
        return Err(FeeHistoryShapeViolation {
            chain_id: profile.chain_id,
            requested_blocks,
            base_fee_len: raw.base_fee_per_gas.len(),
            reward_len: raw.reward_percentiles.len(),
        });
    }

    tracing::debug!(
        chain_id = profile.chain_id,
        family = %profile.family,
        requested_blocks,
        base_fee_len = raw.base_fee_per_gas.len(),
        reward_len = raw.reward_percentiles.len(),
        "normalizing truncated fee history"
    );

    Ok(FeeHistorySample {
        oldest_block: raw.oldest_block,
        base_fee_per_gas: fit_repeating_last(
            raw.base_fee_per_gas,
            base_fee_len,
            profile.target_base_fee_wei,
        ),
        reward_percentiles: fit_with(raw.reward_percentiles, reward_len, 0),
        base_fee_per_blob_gas,
    })
}

/// Truncates or pads `series` to `len`, padding with its last element or `empty_fill`.
fn fit_repeating_last(series: Vec<u128>, len: usize, empty_fill: u128) -> Vec<u128> {
    let fill = series.last().copied().unwrap_or(empty_fill);
    fit_with(series, len, fill)
}

fn fit_with(mut series: Vec<u128>, len: usize, fill: u128) -> Vec<u128> {
    if series.len() > len {
        METRICS.truncated_entries.inc_by((series.len() - len) as u64);
    } else {
        METRICS.padded_entries.inc_by((len - series.len()) as u64);
    }
    series.resize(len, fill);
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use l1_adapter_network::{GWEI, classify};
    use proptest::prelude::*;

    fn raw(base_fees: Vec<u128>, rewards: Vec<u128>) -> RawFeeHistoryResponse {
        RawFeeHistoryResponse {
            oldest_block: 100,
            base_fee_per_gas: base_fees,
            reward_percentiles: rewards,
            base_fee_per_blob_gas: None,
        }
    }

    #[test]
    fn compliant_response_passes_through() {
        let profile = classify(1, None);
        let response = RawFeeHistoryResponse {
            base_fee_per_blob_gas: Some(vec![1, 2, 3]),
            ..raw(vec![10, 11, 12], vec![1, 2])
        };
        let sample = normalize(response.clone(), 2, &profile).unwrap();
        assert_eq!(sample.base_fee_per_gas, response.base_fee_per_gas);
        assert_eq!(sample.reward_percentiles, response.reward_percentiles);
        assert_eq!(sample.base_fee_per_blob_gas, Some(vec![1, 2, 3]));
        assert_eq!(sample.next_block(), 102);
    }

    #[test]
    fn bsc_testnet_truncated_base_fees() {
        let profile = classify(97, None);
        let sample = normalize(raw(vec![0, 0], vec![]), 8, &profile).unwrap();
        assert_eq!(sample.base_fee_per_gas, vec![0; 9]);
        assert_eq!(sample.reward_percentiles, vec![0; 8]);
        assert_eq!(sample.base_fee_per_blob_gas, None);
    }

    #[test]
    fn pads_by_repeating_last_base_fee() {
        let profile = classify(56, None);
        let sample = normalize(raw(vec![5, 7], vec![3]), 4, &profile).unwrap();
        assert_eq!(sample.base_fee_per_gas, vec![5, 7, 7, 7, 7]);
        assert_eq!(sample.reward_percentiles, vec![3, 0, 0, 0]);
    }

    #[test]
    fn empty_base_fees_use_target() {
        let profile = classify(56, None);
        let sample = normalize(raw(vec![], vec![]), 2, &profile).unwrap();
        assert_eq!(sample.base_fee_per_gas, vec![GWEI; 3]);
    }

    #[test]
    fn truncates_long_series() {
        let profile = classify(424_242, None);
        let sample = normalize(raw(vec![1, 2, 3, 4, 5], vec![9, 9, 9, 9]), 2, &profile).unwrap();
        assert_eq!(sample.base_fee_per_gas, vec![1, 2, 3]);
        assert_eq!(sample.reward_percentiles, vec![9, 9]);
    }

    #[test]
    fn drops_blob_series_without_blob_support() {
        let profile = classify(97, None);
        let response = RawFeeHistoryResponse {
            base_fee_per_blob_gas: Some(vec![1, 1, 1]),
            ..raw(vec![1, 1, 1], vec![1, 1])
        };
        let sample = normalize(response, 2, &profile).unwrap();
        assert_eq!(sample.base_fee_per_blob_gas, None);
    }

    #[test]
    fn ethereum_shape_violation_is_an_error() {
        for chain_id in [1, 11_155_111] {
            let profile = classify(chain_id, None);
            let err = normalize(raw(vec![1, 2], vec![1]), 8, &profile).unwrap_err();
            assert_eq!(
                err,
                FeeHistoryShapeViolation {
                    chain_id,
                    requested_blocks: 8,
                    base_fee_len: 2,
                    reward_len: 1,
                }
            );
        }
    }

    #[test]
    fn converts_alloy_fee_history() {
        let history = FeeHistory {
            base_fee_per_gas: vec![1, 2, 3],
            gas_used_ratio: vec![0.5, 0.5],
            base_fee_per_blob_gas: vec![],
            blob_gas_used_ratio: vec![],
            oldest_block: 7,
            reward: Some(vec![vec![10], vec![]]),
        };
        let raw = RawFeeHistoryResponse::from(history);
        assert_eq!(raw.oldest_block, 7);
        assert_eq!(raw.reward_percentiles, vec![10, 0]);
        assert_eq!(raw.base_fee_per_blob_gas, None);
    }

    proptest! {
        #[test]
        fn normalized_lengths_match_request(
            chain_id in prop::sample::select(vec![56u64, 97, 137, 424_242]),
            requested in 0u32..64,
            base_fees in prop::collection::vec(any::<u128>(), 0..80),
            rewards in prop::collection::vec(any::<u128>(), 0..80),
            blob_fees in prop::option::of(prop::collection::vec(any::<u128>(), 0..80)),
        ) {
            let profile = classify(chain_id, None);
            let response = RawFeeHistoryResponse {
                oldest_block: 1,
                base_fee_per_gas: base_fees,
                reward_percentiles: rewards,
                base_fee_per_blob_gas: blob_fees,
            };
            let sample = normalize(response, requested, &profile).unwrap();
            prop_assert_eq!(sample.base_fee_per_gas.len(), requested as usize + 1);
            prop_assert_eq!(sample.reward_percentiles.len(), requested as usize);
        }
    }
}
