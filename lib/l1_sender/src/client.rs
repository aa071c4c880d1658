use alloy::primitives::TxHash;
use alloy::providers::{DynProvider, Provider};
use alloy::transports::RpcError;
use l1_adapter_gas_oracle::FeeHistoryProvider;

/// Inclusion data of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptInfo {
    pub block_number: u64,
    pub success: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The node refused the transaction, e.g. because of an underpriced replacement.
    #[error("transaction rejected by L1 node: {0}")]
    Rejected(String),
    /// The outcome is unknown: the transaction may or may not have reached the mempool.
    #[error("failed to send transaction to L1: {0:#}")]
    Transport(anyhow::Error),
}

/// L1 RPC surface used by the submission tracker.
#[async_trait::async_trait]
pub trait L1Client: FeeHistoryProvider {
    async fn block_number(&self) -> anyhow::Result<u64>;

    /// Returns `None` if the transaction is not (or no longer) included in the canonical chain.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> anyhow::Result<Option<ReceiptInfo>>;

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<TxHash, SendError>;
}

#[async_trait::async_trait]
impl L1Client for DynProvider {
    async fn block_number(&self) -> anyhow::Result<u64> {
        Ok(self.get_block_number().await?)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> anyhow::Result<Option<ReceiptInfo>> {
        let Some(receipt) = self.get_transaction_receipt(tx_hash).await? else {
            return Ok(None);
        };
        // Pending receipts carry no block number.
        Ok(receipt.block_number.map(|block_number| ReceiptInfo {
            block_number,
            success: receipt.status(),
        }))
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<TxHash, SendError> {
        match self.send_raw_transaction(raw_tx).await {
            Ok(pending) => Ok(*pending.tx_hash()),
            Err(RpcError::ErrorResp(payload)) => Err(SendError::Rejected(payload.message.to_string())),
            Err(err) => Err(SendError::Transport(err.into())),
        }
    }
}
