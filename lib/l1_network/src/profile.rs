use crate::family::NetworkFamily;
use serde::{Deserialize, Serialize};

pub const GWEI: u128 = 1_000_000_000;

/// Pricing envelope of a single L1 chain.
///
/// Constructed once per chain id and passed explicitly to every component that needs to know
/// what kind of network it is dealing with. All values are in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub chain_id: u64,
    pub family: NetworkFamily,
    /// Priority fee below which the chain silently drops transactions.
    pub min_priority_fee_wei: u128,
    /// Max priority fee we are willing to pay.
    pub max_priority_fee_wei: u128,
    /// Base fee used when the chain does not report one (or reports zero).
    pub target_base_fee_wei: u128,
    /// Base fee ceiling; sampled base fees above it are clamped.
    pub max_base_fee_wei: u128,
    pub supports_blob_fee: bool,
    /// Multiplier (in percent) applied to the priority fee for `Urgency::Fast`.
    pub fast_priority_multiplier_percent: u32,
    /// Minimum fee increase (in percent) when a transaction is re-broadcast with the same nonce.
    pub resend_bump_percent: u32,
    /// Sampled base fee above which the network is considered congested.
    pub congestion_threshold_wei: u128,
    /// Extra priority fee (in percent) paid while the network is congested.
    pub congestion_boost_percent: u32,
    /// Extra fee (in percent) added to a replacement per block the previous attempt sat unmined.
    pub mempool_boost_percent_per_block: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidProfile {
    #[error("min priority fee {min} is above max priority fee {max}")]
    PriorityFeeRange { min: u128, max: u128 },
    #[error("target base fee {target} is above max base fee {max}")]
    BaseFeeRange { target: u128, max: u128 },
    #[error("{name} must be at least 100%, got {value}%")]
    Multiplier { name: &'static str, value: u32 },
    #[error("congestion threshold {threshold} must be above target base fee {target}")]
    CongestionThreshold { threshold: u128, target: u128 },
}

impl NetworkProfile {
    /// Literal defaults for the given family.
    pub fn for_family(chain_id: u64, family: NetworkFamily) -> Self {
        match family {
            NetworkFamily::EthereumMainnet => Self {
                chain_id,
                family,
                min_priority_fee_wei: GWEI,
                max_priority_fee_wei: 100 * GWEI,
                target_base_fee_wei: 30 * GWEI,
                max_base_fee_wei: 500 * GWEI,
                supports_blob_fee: true,
                fast_priority_multiplier_percent: 150,
                resend_bump_percent: 110,
                congestion_threshold_wei: 100 * GWEI,
                congestion_boost_percent: 25,
                mempool_boost_percent_per_block: 10,
            },
            NetworkFamily::EthereumTestnet => Self {
                chain_id,
                family,
                min_priority_fee_wei: GWEI,
                max_priority_fee_wei: 100 * GWEI,
                target_base_fee_wei: 10 * GWEI,
                max_base_fee_wei: 500 * GWEI,
                supports_blob_fee: true,
                fast_priority_multiplier_percent: 150,
                resend_bump_percent: 110,
                congestion_threshold_wei: 50 * GWEI,
                congestion_boost_percent: 25,
                mempool_boost_percent_per_block: 10,
            },
            // BSC validators enforce a minimum gas price and never report blob fees.
            NetworkFamily::BscMainnet | NetworkFamily::BscTestnet => Self {
                chain_id,
                family,
                min_priority_fee_wei: GWEI / 10,
                max_priority_fee_wei: 2 * GWEI,
                target_base_fee_wei: GWEI,
                max_base_fee_wei: 5 * GWEI,
                supports_blob_fee: false,
                fast_priority_multiplier_percent: 200,
                resend_bump_percent: 200,
                congestion_threshold_wei: 3 * GWEI,
                congestion_boost_percent: 50,
                mempool_boost_percent_per_block: 15,
            },
            NetworkFamily::Generic => Self {
                chain_id,
                family,
                min_priority_fee_wei: GWEI / 10,
                max_priority_fee_wei: GWEI,
                target_base_fee_wei: GWEI,
                max_base_fee_wei: 5 * GWEI,
                supports_blob_fee: false,
                fast_priority_multiplier_percent: 150,
                resend_bump_percent: 125,
                congestion_threshold_wei: 3 * GWEI,
                congestion_boost_percent: 25,
                mempool_boost_percent_per_block: 10,
            },
        }
    }

    pub fn with_priority_fee_range(
        mut self,
        min_priority_fee_wei: u128,
        max_priority_fee_wei: u128,
    ) -> Result<Self, InvalidProfile> {
        self.min_priority_fee_wei = min_priority_fee_wei;
        self.max_priority_fee_wei = max_priority_fee_wei;
        self.validate().map(|()| self)
    }

    pub fn with_base_fee_range(
        mut self,
        target_base_fee_wei: u128,
        max_base_fee_wei: u128,
    ) -> Result<Self, InvalidProfile> {
        self.target_base_fee_wei = target_base_fee_wei;
        self.max_base_fee_wei = max_base_fee_wei;
        self.validate().map(|()| self)
    }

    pub fn validate(&self) -> Result<(), InvalidProfile> {
        if self.min_priority_fee_wei > self.max_priority_fee_wei {
            return Err(InvalidProfile::PriorityFeeRange {
                min: self.min_priority_fee_wei,
                max: self.max_priority_fee_wei,
            });
        }
        if self.target_base_fee_wei > self.max_base_fee_wei {
            return Err(InvalidProfile::BaseFeeRange {
                target: self.target_base_fee_wei,
                max: self.max_base_fee_wei,
            });
        }
        if self.fast_priority_multiplier_percent < 100 {
            return Err(InvalidProfile::Multiplier {
                name: "fast_priority_multiplier_percent",
                value: self.fast_priority_multiplier_percent,
            });
        }
        if self.resend_bump_percent < 100 {
            return Err(InvalidProfile::Multiplier {
                name: "resend_bump_percent",
                value: self.resend_bump_percent,
            });
        }
        if self.congestion_threshold_wei <= self.target_base_fee_wei {
            return Err(InvalidProfile::CongestionThreshold {
                threshold: self.congestion_threshold_wei,
                target: self.target_base_fee_wei,
            });
        }
        Ok(())
    }
}
