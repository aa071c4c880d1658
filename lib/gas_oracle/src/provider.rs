use crate::fee_history::RawFeeHistoryResponse;
use alloy::eips::BlockNumberOrTag;
use alloy::providers::{DynProvider, Provider};

/// Max number of blocks a node serves in a single `eth_feeHistory` request.
pub const FEE_HISTORY_MAX_REQUEST_CHUNK: u64 = 1023;

#[async_trait::async_trait]
pub trait FeeHistoryProvider: Send + Sync + std::fmt::Debug {
    /// Requests fee history for `block_count` blocks ending at `newest_block`, with rewards at a
    /// single `reward_percentile`.
    ///
    /// The response is returned as is; its shape is not validated here.
    async fn raw_fee_history(
        &self,
        block_count: u64,
        newest_block: BlockNumberOrTag,
        reward_percentile: f64,
    ) -> anyhow::Result<RawFeeHistoryResponse>;
}

#[async_trait::async_trait]
impl FeeHistoryProvider for DynProvider {
    async fn raw_fee_history(
        &self,
        block_count: u64,
        newest_block: BlockNumberOrTag,
        reward_percentile: f64,
    ) -> anyhow::Result<RawFeeHistoryResponse> {
        if block_count > FEE_HISTORY_MAX_REQUEST_CHUNK {
            anyhow::bail!(
                "requested fee history for {block_count} blocks, at most {FEE_HISTORY_MAX_REQUEST_CHUNK} are supported"
            );
        }
        let fee_history = self
            .get_fee_history(block_count, newest_block, &[reward_percentile])
            .await?;
        Ok(fee_history.into())
    }
}
