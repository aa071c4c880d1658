//! This module determines the fees to pay in txs submitted to the L1.
//!
//! Fee history returned by the L1 node is first normalized to a fixed shape (some networks return
//! truncated arrays), then turned into a [`GasQuote`] bounded by the network profile.

mod fee_history;
mod metrics;
mod oracle;
mod provider;
mod statistics;

pub use fee_history::{
    FeeHistorySample, FeeHistoryShapeViolation, RawFeeHistoryResponse, normalize,
};
pub use oracle::{DEFAULT_REWARD_PERCENTILE, GasQuote, Urgency, recommend, reprice};
pub use provider::{FEE_HISTORY_MAX_REQUEST_CHUNK, FeeHistoryProvider};
