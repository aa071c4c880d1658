use crate::fee_history::FeeHistorySample;
use crate::metrics::METRICS;
use crate::statistics::upper_median;
use l1_adapter_network::NetworkProfile;
use serde::{Deserialize, Serialize};

/// Reward percentile requested from `eth_feeHistory` by default.
pub const DEFAULT_REWARD_PERCENTILE: u32 = 20;

/// Blocks in the mempool beyond this don't raise replacement fees any further.
const MEMPOOL_BLOCKS_CAP: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Normal,
    /// Used when re-pricing a transaction that did not make it on chain in time.
    Fast,
}

/// Fees to submit a single transaction attempt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasQuote {
    pub base_fee_wei: u128,
    pub priority_fee_wei: u128,
    pub computed_at_block: u64,
}

impl GasQuote {
    /// `maxFeePerGas` for an EIP-1559 transaction: leaves room for the base fee to double.
    pub fn max_fee_per_gas(&self) -> u128 {
        self.base_fee_wei
            .saturating_mul(2)
            .saturating_add(self.priority_fee_wei)
    }
}

/// Recommends fees for a new transaction based on a normalized fee history sample.
///
/// The base fee is the one reported for the next block, falling back to the profile target when
/// the network reports none (or zero), and clamped to the profile ceiling. The priority fee is the
/// median historical reward, never below the profile floor: some networks silently drop
/// transactions priced below their minimum even if the fee market suggests a lower tip.
///
/// While the sampled base fee is above the profile congestion threshold, the priority fee is
/// raised by `congestion_boost_percent` on top of everything else.
pub fn recommend(sample: &FeeHistorySample, profile: &NetworkProfile, urgency: Urgency) -> GasQuote {
    let base_fee_wei = base_fee(sample, profile);

    let reward_median = upper_median(&sample.reward_percentiles);
    let mut priority_fee_wei = reward_median.max(profile.min_priority_fee_wei);
    if urgency == Urgency::Fast {
        priority_fee_wei = apply_percent(priority_fee_wei, profile.fast_priority_multiplier_percent);
    }
    if let Some(sampled) = sample
        .next_base_fee()
        .filter(|&fee| fee > profile.congestion_threshold_wei)
    {
        tracing::debug!(
            chain_id = profile.chain_id,
            base_fee = sampled,
            threshold = profile.congestion_threshold_wei,
            "L1 is congested, boosting priority fee"
        );
        METRICS.congestion_boosts.inc();
        priority_fee_wei = apply_percent(priority_fee_wei, 100 + profile.congestion_boost_percent);
    }
    let priority_fee_wei = bound_priority_fee(priority_fee_wei, profile);

    report(base_fee_wei, priority_fee_wei);
    GasQuote {
        base_fee_wei,
        priority_fee_wei,
        computed_at_block: sample.next_block(),
    }
}

/// Prices a replacement for a transaction previously sent with `previous`.
///
/// Both fees are raised by at least `resend_bump_percent` over the previous attempt (L1 mempools
/// reject same-nonce replacements that don't bump fees), and at least to what a fresh
/// `Urgency::Fast` quote suggests. The bumped fees grow further by
/// `mempool_boost_percent_per_block` for every block mined since the previous attempt was priced,
/// up to 10 blocks. Profile ceilings still apply.
pub fn reprice(
    previous: &GasQuote,
    sample: &FeeHistorySample,
    profile: &NetworkProfile,
) -> GasQuote {
    let fresh = recommend(sample, profile, Urgency::Fast);
    let blocks_in_mempool = fresh
        .computed_at_block
        .saturating_sub(previous.computed_at_block)
        .min(MEMPOOL_BLOCKS_CAP);
    // Fits in u32: the block count is capped.
    let mempool_percent =
        100 + profile.mempool_boost_percent_per_block.saturating_mul(blocks_in_mempool as u32);
    let replace = |previous_fee: u128| {
        apply_percent(bump(previous_fee, profile.resend_bump_percent), mempool_percent)
    };

    let base_fee_wei = fresh
        .base_fee_wei
        .max(replace(previous.base_fee_wei))
        .min(profile.max_base_fee_wei);
    let priority_fee_wei = bound_priority_fee(
        fresh.priority_fee_wei.max(replace(previous.priority_fee_wei)),
        profile,
    );

    if priority_fee_wei <= previous.priority_fee_wei {
        tracing::warn!(
            chain_id = profile.chain_id,
            previous_priority_fee = previous.priority_fee_wei,
            max_priority_fee = profile.max_priority_fee_wei,
            "priority fee ceiling reached, replacement transaction may be rejected"
        );
        METRICS.priority_fee_ceiling_hits.inc();
    }

    report(base_fee_wei, priority_fee_wei);
    GasQuote {
        base_fee_wei,
        priority_fee_wei,
        computed_at_block: fresh.computed_at_block,
    }
}

fn base_fee(sample: &FeeHistorySample, profile: &NetworkProfile) -> u128 {
    let base_fee = match sample.next_base_fee() {
        Some(fee) if fee > 0 => fee,
        // BSC reports zero base fees; empty samples have nothing to go on.
        _ => profile.target_base_fee_wei,
    };
    if base_fee > profile.max_base_fee_wei {
        tracing::warn!(
            chain_id = profile.chain_id,
            base_fee,
            max_base_fee = profile.max_base_fee_wei,
            "sampled base fee exceeds profile ceiling, clamping"
        );
        METRICS.clamped_base_fees.inc();
        return profile.max_base_fee_wei;
    }
    base_fee
}

/// Caps at the profile max first, so that the floor wins even for a misconfigured profile.
fn bound_priority_fee(fee: u128, profile: &NetworkProfile) -> u128 {
    fee.min(profile.max_priority_fee_wei)
        .max(profile.min_priority_fee_wei)
}

fn apply_percent(value: u128, percent: u32) -> u128 {
    value.saturating_mul(percent as u128) / 100
}

/// Strictly greater than `value`, and at least `value * percent / 100` rounded up.
fn bump(value: u128, percent: u32) -> u128 {
    let bumped = value.saturating_mul(percent as u128).div_ceil(100);
    bumped.max(value.saturating_add(1))
}

fn report(base_fee_wei: u128, priority_fee_wei: u128) {
    if let Ok(base_fee) = u64::try_from(base_fee_wei) {
        METRICS.recommended_base_fee_per_gas.set(base_fee);
    }
    if let Ok(priority_fee) = u64::try_from(priority_fee_wei) {
        METRICS.recommended_priority_fee_per_gas.set(priority_fee);
    }
}
