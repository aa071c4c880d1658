use crate::family::NetworkFamily;
use crate::profile::NetworkProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bumped whenever a value in the family table below changes.
pub const CONFIG_TABLE_VERSION: u32 = 1;

/// Number of expected L1 blocks after which an unconfirmed transaction is considered stuck.
pub const DEFAULT_STUCK_TIMEOUT_BLOCKS: u32 = 10;

/// Number of broadcasts (initial one included) before a transaction is failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How the adapter operates against a particular L1 chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1OperatingConfig {
    /// Blocks that must be mined on top of the inclusion block before a tx counts as confirmed.
    pub wait_confirmations: u32,
    /// Max number of transactions broadcast but not yet confirmed.
    pub max_in_flight_tx: u32,
    /// How often to poll L1 for receipts.
    pub poll_interval: Duration,
    /// Deadline after which a batch commit should be sent even if not full.
    pub batch_commit_deadline: Duration,
    pub aggressive_batching: bool,
    pub expected_block_time: Duration,
    /// Time without a receipt after which a submitted transaction is re-priced.
    pub stuck_timeout: Duration,
    pub max_attempts: u32,
}

/// Operator-provided tunables applied on top of the resolved family row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatingOverrides {
    pub wait_confirmations: Option<u32>,
    pub max_in_flight_tx: Option<u32>,
    pub max_attempts: Option<u32>,
    pub stuck_timeout_blocks: Option<u32>,
}

struct FamilyRow {
    wait_confirmations: u32,
    max_in_flight_tx: u32,
    poll_interval: Duration,
    batch_commit_deadline: Duration,
    aggressive_batching: bool,
    expected_block_time: Duration,
}

fn family_row(family: NetworkFamily) -> FamilyRow {
    match family {
        NetworkFamily::EthereumMainnet => FamilyRow {
            wait_confirmations: 12,
            max_in_flight_tx: 30,
            poll_interval: Duration::from_secs(12),
            batch_commit_deadline: Duration::from_secs(300),
            aggressive_batching: false,
            expected_block_time: Duration::from_secs(12),
        },
        NetworkFamily::EthereumTestnet => FamilyRow {
            wait_confirmations: 6,
            max_in_flight_tx: 30,
            poll_interval: Duration::from_secs(6),
            batch_commit_deadline: Duration::from_secs(120),
            aggressive_batching: false,
            expected_block_time: Duration::from_secs(12),
        },
        // ~3s blocks with fast finality.
        NetworkFamily::BscMainnet | NetworkFamily::BscTestnet => FamilyRow {
            wait_confirmations: 2,
            max_in_flight_tx: 50,
            poll_interval: Duration::from_millis(1500),
            batch_commit_deadline: Duration::from_secs(3),
            aggressive_batching: true,
            expected_block_time: Duration::from_secs(3),
        },
        NetworkFamily::Generic => FamilyRow {
            wait_confirmations: 64,
            max_in_flight_tx: 10,
            poll_interval: Duration::from_secs(15),
            batch_commit_deadline: Duration::from_secs(600),
            aggressive_batching: false,
            expected_block_time: Duration::from_secs(15),
        },
    }
}

/// Maps a network profile to its operating configuration.
pub fn resolve(profile: &NetworkProfile) -> L1OperatingConfig {
    let row = family_row(profile.family);
    let config = L1OperatingConfig {
        wait_confirmations: row.wait_confirmations,
        max_in_flight_tx: row.max_in_flight_tx,
        poll_interval: row.poll_interval,
        batch_commit_deadline: row.batch_commit_deadline,
        aggressive_batching: row.aggressive_batching,
        expected_block_time: row.expected_block_time,
        stuck_timeout: row.expected_block_time * DEFAULT_STUCK_TIMEOUT_BLOCKS,
        max_attempts: DEFAULT_MAX_ATTEMPTS,
    };
    tracing::info!(
        chain_id = profile.chain_id,
        family = %profile.family,
        table_version = CONFIG_TABLE_VERSION,
        ?config,
        "resolved L1 operating config"
    );
    config
}

impl L1OperatingConfig {
    pub fn with_overrides(mut self, overrides: &OperatingOverrides) -> Self {
        if let Some(wait_confirmations) = overrides.wait_confirmations {
            self.wait_confirmations = wait_confirmations;
        }
        if let Some(max_in_flight_tx) = overrides.max_in_flight_tx {
            self.max_in_flight_tx = max_in_flight_tx.max(1);
        }
        if let Some(max_attempts) = overrides.max_attempts {
            self.max_attempts = max_attempts.max(1);
        }
        if let Some(blocks) = overrides.stuck_timeout_blocks {
            self.stuck_timeout = self.expected_block_time * blocks.max(1);
        }
        self
    }
}
