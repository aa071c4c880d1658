use l1_adapter_gas_oracle::DEFAULT_REWARD_PERCENTILE;
use l1_adapter_network::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_STUCK_TIMEOUT_BLOCKS, InvalidProfile, NetworkProfile,
    OperatingOverrides,
};
use smart_config::{DescribeConfig, DeserializeConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration of the L1 submission tracker.
///
/// Network-dependent values (confirmation depth, in-flight limit, polling cadence) are resolved
/// from the network profile; the optional fields here only override them. The same goes for fee
/// bounds.
#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct TrackerConfig {
    /// Max time to wait for a single L1 RPC call.
    #[config(default_t = Duration::from_secs(10))]
    pub rpc_timeout: Duration,
    /// Number of blocks to request fee history for on each pricing decision.
    #[config(default_t = 8)]
    pub fee_history_blocks: u32,
    /// Percentile of priority fees paid in sampled blocks to base recommendations on.
    #[config(default_t = DEFAULT_REWARD_PERCENTILE)]
    pub reward_percentile: u32,
    /// Max number of times a single transaction is broadcast before it's reported as failed.
    #[config(default_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
    /// Number of expected block times without a receipt after which a transaction is stuck.
    #[config(default_t = DEFAULT_STUCK_TIMEOUT_BLOCKS)]
    pub stuck_timeout_blocks: u32,
    /// Max number of concurrent receipt queries on each poll.
    #[config(default_t = 8)]
    pub receipt_query_concurrency: usize,
    /// Overrides the number of confirmations resolved for the network.
    #[config(default)]
    pub wait_confirmations: Option<u32>,
    /// Overrides the max number of in-flight transactions resolved for the network.
    #[config(default)]
    pub max_in_flight_tx: Option<u32>,
    /// Overrides the priority fee floor of the network profile.
    #[config(default)]
    pub min_priority_fee_wei: Option<u64>,
    /// Overrides the priority fee ceiling of the network profile.
    #[config(default)]
    pub max_priority_fee_wei: Option<u64>,
    /// Overrides the base fee assumed when the network reports none.
    #[config(default)]
    pub target_base_fee_wei: Option<u64>,
    /// Overrides the base fee ceiling of the network profile.
    #[config(default)]
    pub max_base_fee_wei: Option<u64>,
    /// Where to persist in-flight transactions on shutdown. Nothing is persisted if unset.
    #[config(default)]
    pub state_path: Option<PathBuf>,
}

impl TrackerConfig {
    pub fn overrides(&self) -> OperatingOverrides {
        OperatingOverrides {
            wait_confirmations: self.wait_confirmations,
            max_in_flight_tx: self.max_in_flight_tx,
            max_attempts: Some(self.max_attempts),
            stuck_timeout_blocks: Some(self.stuck_timeout_blocks),
        }
    }

    /// Applies configured fee bounds to the default `profile` of the network.
    pub fn apply_fee_overrides(
        &self,
        mut profile: NetworkProfile,
    ) -> Result<NetworkProfile, InvalidProfile> {
        if self.min_priority_fee_wei.is_some() || self.max_priority_fee_wei.is_some() {
            profile = profile.with_priority_fee_range(
                self.min_priority_fee_wei
                    .map_or(profile.min_priority_fee_wei, u128::from),
                self.max_priority_fee_wei
                    .map_or(profile.max_priority_fee_wei, u128::from),
            )?;
        }
        if self.target_base_fee_wei.is_some() || self.max_base_fee_wei.is_some() {
            profile = profile.with_base_fee_range(
                self.target_base_fee_wei
                    .map_or(profile.target_base_fee_wei, u128::from),
                self.max_base_fee_wei.map_or(profile.max_base_fee_wei, u128::from),
            )?;
        }
        Ok(profile)
    }

    pub fn reward_percentile(&self) -> f64 {
        f64::from(self.reward_percentile.min(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l1_adapter_network::{GWEI, classify};

    #[test]
    fn defaults_only_override_retry_policy() {
        let config = TrackerConfig::default();
        assert_eq!(config.rpc_timeout, Duration::from_secs(10));
        assert_eq!(config.reward_percentile(), 20.0);
        assert_eq!(
            config.overrides(),
            OperatingOverrides {
                wait_confirmations: None,
                max_in_flight_tx: None,
                max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
                stuck_timeout_blocks: Some(DEFAULT_STUCK_TIMEOUT_BLOCKS),
            }
        );
    }

    #[test]
    fn fee_overrides_apply_on_top_of_profile() {
        let profile = classify(97, None);
        let config = TrackerConfig::default();
        assert_eq!(config.apply_fee_overrides(profile), Ok(profile));

        let config = TrackerConfig {
            min_priority_fee_wei: Some(GWEI as u64 / 2),
            max_base_fee_wei: Some(10 * GWEI as u64),
            ..TrackerConfig::default()
        };
        let overridden = config.apply_fee_overrides(profile).unwrap();
        assert_eq!(overridden.min_priority_fee_wei, GWEI / 2);
        assert_eq!(overridden.max_priority_fee_wei, profile.max_priority_fee_wei);
        assert_eq!(overridden.target_base_fee_wei, profile.target_base_fee_wei);
        assert_eq!(overridden.max_base_fee_wei, 10 * GWEI);
    }

    #[test]
    fn inverted_fee_overrides_are_rejected() {
        let config = TrackerConfig {
            min_priority_fee_wei: Some(3 * GWEI as u64),
            ..TrackerConfig::default()
        };
        assert_eq!(
            config.apply_fee_overrides(classify(97, None)),
            Err(InvalidProfile::PriorityFeeRange {
                min: 3 * GWEI,
                max: 2 * GWEI,
            })
        );
    }
}
