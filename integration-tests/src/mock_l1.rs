use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Bytes, TxHash, keccak256};
use l1_adapter_gas_oracle::{FeeHistoryProvider, GasQuote, RawFeeHistoryResponse};
use l1_adapter_sender::{
    L1Client, PayloadSigner, ReceiptInfo, SendError, SignedTx, TransactionPayload,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

/// What [`MockSigner`] puts into a "signed" transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAttempt {
    pub nonce: u64,
    pub quote: GasQuote,
}

/// Transaction as seen by [`MockL1`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastTx {
    pub hash: TxHash,
    pub nonce: u64,
    pub quote: GasQuote,
    pub sent_at: Instant,
}

#[derive(Debug)]
pub struct MockSigner;

#[async_trait::async_trait]
impl PayloadSigner for MockSigner {
    async fn sign(
        &self,
        payload: &TransactionPayload,
        quote: &GasQuote,
    ) -> anyhow::Result<SignedTx> {
        let raw = serde_json::to_vec(&SignedAttempt {
            nonce: payload.nonce,
            quote: *quote,
        })?;
        Ok(SignedTx {
            hash: keccak256(&raw),
            raw: Bytes::from(raw),
        })
    }
}

#[derive(Debug, Default)]
struct MockL1State {
    head: u64,
    fee_history: Option<RawFeeHistoryResponse>,
    fee_history_requests: usize,
    receipts: HashMap<TxHash, ReceiptInfo>,
    rejections: VecDeque<String>,
    broadcasts: Vec<BroadcastTx>,
}

/// In-memory L1 node. Transactions are never mined on their own: tests include them explicitly.
#[derive(Debug, Default)]
pub struct MockL1 {
    state: Mutex<MockL1State>,
}

impl MockL1 {
    pub fn new(head: u64, fee_history: RawFeeHistoryResponse) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockL1State {
                head,
                fee_history: Some(fee_history),
                ..MockL1State::default()
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, MockL1State> {
        self.state.lock().unwrap()
    }

    pub fn head(&self) -> u64 {
        self.state().head
    }

    pub fn advance(&self, blocks: u64) {
        self.state().head += blocks;
    }

    /// `None` makes fee history requests fail.
    pub fn set_fee_history(&self, fee_history: Option<RawFeeHistoryResponse>) {
        self.state().fee_history = fee_history;
    }

    pub fn fee_history_requests(&self) -> usize {
        self.state().fee_history_requests
    }

    /// Rejects the next `count` broadcasts with `reason`.
    pub fn reject_next(&self, count: usize, reason: &str) {
        let mut state = self.state();
        state
            .rejections
            .extend(std::iter::repeat_n(reason.to_owned(), count));
    }

    /// Includes `hash` into the current head block.
    pub fn include(&self, hash: TxHash, success: bool) -> u64 {
        let mut state = self.state();
        let block_number = state.head;
        state.receipts.insert(
            hash,
            ReceiptInfo {
                block_number,
                success,
            },
        );
        block_number
    }

    /// Reorgs `hash` out of the chain.
    pub fn drop_receipt(&self, hash: TxHash) {
        self.state().receipts.remove(&hash);
    }

    pub fn broadcasts(&self) -> Vec<BroadcastTx> {
        self.state().broadcasts.clone()
    }

    pub fn last_broadcast(&self) -> Option<BroadcastTx> {
        self.state().broadcasts.last().copied()
    }
}

#[async_trait::async_trait]
impl FeeHistoryProvider for MockL1 {
    async fn raw_fee_history(
        &self,
        _block_count: u64,
        _newest_block: BlockNumberOrTag,
        _reward_percentile: f64,
    ) -> anyhow::Result<RawFeeHistoryResponse> {
        let mut state = self.state();
        state.fee_history_requests += 1;
        let head = state.head;
        let mut fee_history = state
            .fee_history
            .clone()
            .ok_or_else(|| anyhow::anyhow!("fee history is unavailable"))?;
        fee_history.oldest_block = head.saturating_sub(fee_history.reward_percentiles.len() as u64);
        Ok(fee_history)
    }
}

#[async_trait::async_trait]
impl L1Client for MockL1 {
    async fn block_number(&self) -> anyhow::Result<u64> {
        Ok(self.head())
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> anyhow::Result<Option<ReceiptInfo>> {
        Ok(self.state().receipts.get(&tx_hash).copied())
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<TxHash, SendError> {
        let mut state = self.state();
        if let Some(reason) = state.rejections.pop_front() {
            return Err(SendError::Rejected(reason));
        }
        let attempt: SignedAttempt =
            serde_json::from_slice(raw_tx).map_err(|err| SendError::Transport(err.into()))?;
        let hash = keccak256(raw_tx);
        state.broadcasts.push(BroadcastTx {
            hash,
            nonce: attempt.nonce,
            quote: attempt.quote,
            sent_at: Instant::now(),
        });
        Ok(hash)
    }
}
