mod mock_l1;

pub use mock_l1::{BroadcastTx, MockL1, MockSigner, SignedAttempt};

use l1_adapter_gas_oracle::RawFeeHistoryResponse;
use l1_adapter_network::GWEI;
use l1_adapter_sender::{
    SubmissionTracker, TrackedTransactionHandle, TrackerConfig, TransactionPayload, TxState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Fee history blocks requested by trackers started with [`Tester`].
pub const FEE_HISTORY_BLOCKS: u32 = 8;

/// Fee history of a well-behaved node: `FEE_HISTORY_BLOCKS + 1` base fees and one reward per
/// block.
pub fn well_formed_fee_history(base_fee: u128, reward: u128) -> RawFeeHistoryResponse {
    RawFeeHistoryResponse {
        oldest_block: 0,
        base_fee_per_gas: vec![base_fee; FEE_HISTORY_BLOCKS as usize + 1],
        reward_percentiles: vec![reward; FEE_HISTORY_BLOCKS as usize],
        base_fee_per_blob_gas: None,
    }
}

/// Fee history as returned by BSC testnet nodes: two zero base fees and no rewards.
pub fn bsc_testnet_fee_history() -> RawFeeHistoryResponse {
    RawFeeHistoryResponse {
        oldest_block: 0,
        base_fee_per_gas: vec![0, 0],
        reward_percentiles: vec![],
        base_fee_per_blob_gas: None,
    }
}

pub fn payload(nonce: u64) -> TransactionPayload {
    TransactionPayload {
        nonce,
        to: alloy::primitives::Address::repeat_byte(0x11),
        input: alloy::primitives::Bytes::from(nonce.to_be_bytes().to_vec()),
        gas_limit: 1_000_000,
    }
}

/// Submission tracker running against a [`MockL1`].
pub struct Tester {
    pub l1: Arc<MockL1>,
    pub tracker: SubmissionTracker,
    task: JoinHandle<anyhow::Result<()>>,
}

impl Tester {
    pub fn builder(chain_id: u64) -> TesterBuilder {
        TesterBuilder {
            chain_id,
            config: TrackerConfig {
                fee_history_blocks: FEE_HISTORY_BLOCKS,
                ..TrackerConfig::default()
            },
            l1: None,
        }
    }

    /// Shuts the tracker down and waits for its task to finish.
    pub async fn stop(self) -> anyhow::Result<()> {
        self.tracker.shutdown().await?;
        self.task.await?
    }
}

pub struct TesterBuilder {
    chain_id: u64,
    config: TrackerConfig,
    l1: Option<Arc<MockL1>>,
}

impl TesterBuilder {
    pub fn config(mut self, update: impl FnOnce(&mut TrackerConfig)) -> Self {
        update(&mut self.config);
        self
    }

    pub fn l1(mut self, l1: Arc<MockL1>) -> Self {
        self.l1 = Some(l1);
        self
    }

    pub fn start(self) -> anyhow::Result<Tester> {
        let l1 = self
            .l1
            .unwrap_or_else(|| MockL1::new(1_000, well_formed_fee_history(20 * GWEI, 2 * GWEI)));
        let (tracker, task) = SubmissionTracker::new(
            self.chain_id,
            None,
            self.config,
            l1.clone(),
            Arc::new(MockSigner),
        )?;
        let task = tokio::spawn(task.run());
        Ok(Tester { l1, tracker, task })
    }
}

/// Polls `condition` until it holds. Meant for tests running on paused time.
pub async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    const DEADLINE: Duration = Duration::from_secs(3_600);
    const STEP: Duration = Duration::from_millis(100);

    let mut waited = Duration::ZERO;
    while !condition() {
        assert!(waited < DEADLINE, "timed out waiting for {what}");
        tokio::time::sleep(STEP).await;
        waited += STEP;
    }
}

pub async fn wait_for_state(
    handle: &TrackedTransactionHandle,
    what: &str,
    matches: impl Fn(&TxState) -> bool,
) {
    eventually(what, || matches(&handle.status())).await;
}
