use alloy::primitives::{Address, Bytes, TxHash};
use l1_adapter_gas_oracle::GasQuote;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{OwnedSemaphorePermit, watch};
use tokio::time::Instant;

/// Identifier assigned to a transaction when it's handed to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unsigned transaction to be submitted to L1.
///
/// Fees are not part of the payload: every attempt is signed anew with the fees of its quote,
/// always with the same nonce so that attempts replace each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub nonce: u64,
    pub to: Address,
    pub input: Bytes,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub hash: TxHash,
    /// EIP-2718 encoded transaction.
    pub raw: Bytes,
}

/// Signs transaction attempts. Key management is up to the implementation.
#[async_trait::async_trait]
pub trait PayloadSigner: Send + Sync + fmt::Debug + 'static {
    async fn sign(&self, payload: &TransactionPayload, quote: &GasQuote)
    -> anyhow::Result<SignedTx>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxState {
    /// Accepted by the tracker, not broadcast yet.
    Pending,
    Submitted,
    /// Included in a block, `depth` blocks were mined on top of it so far.
    AwaitingConfirmations { depth: u64 },
    /// No receipt within the stuck timeout, or the last broadcast was rejected.
    Stuck,
    /// Re-priced, replacement broadcast in progress.
    Resubmitted,
    Confirmed { block_number: u64 },
    Failed(TxFailureReason),
    Cancelled,
}

impl TxState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed { .. } | Self::Failed(_) | Self::Cancelled
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::AwaitingConfirmations { .. } => "awaiting_confirmations",
            Self::Stuck => "stuck",
            Self::Resubmitted => "resubmitted",
            Self::Confirmed { .. } => "confirmed",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub(crate) const IN_FLIGHT_LABELS: [&'static str; 5] = [
        "pending",
        "submitted",
        "awaiting_confirmations",
        "stuck",
        "resubmitted",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum TxFailureReason {
    #[error("not confirmed after {max_attempts} attempts")]
    RetryBudgetExhausted { max_attempts: u32 },
    #[error("reverted in block {block_number}")]
    Reverted { block_number: u64 },
    #[error("failed to sign: {0}")]
    Signing(String),
    #[error("cannot price transaction: {0}")]
    FeeHistoryShapeViolation(String),
}

/// Snapshot of a tracked transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxStatus {
    pub id: TxId,
    pub nonce: u64,
    pub state: TxState,
    /// Number of broadcasts so far, the initial one included.
    pub attempt_count: u32,
    /// Quotes of all attempts, oldest first.
    pub quote_history: Vec<GasQuote>,
    /// Hash of the latest attempt, or of the attempt that got included.
    pub tx_hash: Option<TxHash>,
}

impl TxStatus {
    pub fn last_quote(&self) -> Option<&GasQuote> {
        self.quote_history.last()
    }
}

/// Terminal failure of a tracked transaction, with everything needed to diagnose it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("L1 transaction {id} with nonce {nonce} failed after {attempt_count} attempts: {reason}")]
pub struct TxFailure {
    pub id: TxId,
    pub nonce: u64,
    pub reason: TxFailureReason,
    pub attempt_count: u32,
    pub quote_history: Vec<GasQuote>,
}

impl TxFailure {
    pub fn last_quote(&self) -> Option<&GasQuote> {
        self.quote_history.last()
    }
}

/// Transaction that made it on chain with enough confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub attempt_count: u32,
}

/// Tracker-side record of a transaction. Owned by the tracker loop, which is its only writer.
#[derive(Debug)]
pub(crate) struct TrackedTransaction {
    pub id: TxId,
    pub payload: TransactionPayload,
    pub state: TxState,
    pub attempt_count: u32,
    pub quote_history: Vec<GasQuote>,
    /// Hashes of all attempts that may have reached the mempool, oldest first.
    pub tx_hashes: Vec<TxHash>,
    pub included_hash: Option<TxHash>,
    pub last_submitted_at: Instant,
    updates: watch::Sender<TxStatus>,
    /// Released once the transaction reaches a terminal state.
    slot: Option<OwnedSemaphorePermit>,
}

impl TrackedTransaction {
    pub fn new(id: TxId, payload: TransactionPayload, slot: Option<OwnedSemaphorePermit>) -> Self {
        let initial = TxStatus {
            id,
            nonce: payload.nonce,
            state: TxState::Pending,
            attempt_count: 0,
            quote_history: Vec::new(),
            tx_hash: None,
        };
        Self {
            id,
            payload,
            state: TxState::Pending,
            attempt_count: 0,
            quote_history: Vec::new(),
            tx_hashes: Vec::new(),
            included_hash: None,
            last_submitted_at: Instant::now(),
            updates: watch::Sender::new(initial),
            slot,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TxStatus> {
        self.updates.subscribe()
    }

    pub fn last_quote(&self) -> Option<&GasQuote> {
        self.quote_history.last()
    }

    /// Whether at least one attempt may have reached the mempool.
    pub fn was_broadcast(&self) -> bool {
        !self.tx_hashes.is_empty()
    }

    pub fn status(&self) -> TxStatus {
        TxStatus {
            id: self.id,
            nonce: self.payload.nonce,
            state: self.state.clone(),
            attempt_count: self.attempt_count,
            quote_history: self.quote_history.clone(),
            tx_hash: self.included_hash.or_else(|| self.tx_hashes.last().copied()),
        }
    }

    /// Moves to `state` and notifies subscribers. Returns the published snapshot.
    pub fn transition(&mut self, state: TxState) -> TxStatus {
        tracing::debug!(
            id = %self.id,
            nonce = self.payload.nonce,
            from = self.state.label(),
            to = state.label(),
            "L1 transaction state change"
        );
        self.state = state;
        if self.state.is_terminal() {
            self.slot = None;
        }
        let status = self.status();
        self.updates.send_replace(status.clone());
        status
    }
}
