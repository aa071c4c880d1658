use crate::model::{TrackedTransaction, TransactionPayload, TxId, TxState};
use alloy::primitives::TxHash;
use anyhow::Context;
use l1_adapter_gas_oracle::GasQuote;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::OwnedSemaphorePermit;

const STATE_FORMAT_VERSION: u32 = 1;

/// In-flight transaction as persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PersistedTx {
    pub id: TxId,
    pub payload: TransactionPayload,
    pub attempt_count: u32,
    pub quote_history: Vec<GasQuote>,
    pub tx_hashes: Vec<TxHash>,
}

impl From<&TrackedTransaction> for PersistedTx {
    fn from(tx: &TrackedTransaction) -> Self {
        Self {
            id: tx.id,
            payload: tx.payload.clone(),
            attempt_count: tx.attempt_count,
            quote_history: tx.quote_history.clone(),
            tx_hashes: tx.tx_hashes.clone(),
        }
    }
}

impl PersistedTx {
    /// Broadcast transactions come back as `Submitted`: they are re-queried, never re-sent
    /// before their stuck timeout elapses again.
    pub fn restore(self, slot: Option<OwnedSemaphorePermit>) -> TrackedTransaction {
        let mut tx = TrackedTransaction::new(self.id, self.payload, slot);
        tx.attempt_count = self.attempt_count;
        tx.quote_history = self.quote_history;
        tx.tx_hashes = self.tx_hashes;
        let state = if tx.was_broadcast() {
            TxState::Submitted
        } else {
            TxState::Pending
        };
        tx.transition(state);
        tx
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    version: u32,
    chain_id: u64,
    transactions: Vec<PersistedTx>,
}

/// Loads transactions persisted by a previous run. A missing file means there are none.
pub(crate) fn load(path: &Path, chain_id: u64) -> anyhow::Result<Vec<PersistedTx>> {
    let contents = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let state: PersistedState = serde_json::from_slice(&contents)
        .with_context(|| format!("malformed tracker state in {}", path.display()))?;
    anyhow::ensure!(
        state.version == STATE_FORMAT_VERSION,
        "unsupported tracker state version {} in {}",
        state.version,
        path.display()
    );
    anyhow::ensure!(
        state.chain_id == chain_id,
        "tracker state in {} belongs to chain {}, not {chain_id}",
        path.display(),
        state.chain_id
    );
    Ok(state.transactions)
}

/// Atomically replaces the state file with `transactions`.
pub(crate) fn store(path: &Path, chain_id: u64, transactions: Vec<PersistedTx>) -> anyhow::Result<()> {
    let state = PersistedState {
        version: STATE_FORMAT_VERSION,
        chain_id,
        transactions,
    };
    let contents = serde_json::to_vec_pretty(&state)?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, contents)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to move tracker state to {}", path.display()))?;
    Ok(())
}

/// Removes the state file once its transactions are owned by a running tracker.
pub(crate) fn clear(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}
