//! Submission and tracking of L1 transactions.
//!
//! [`SubmissionTracker`] prices transactions with the gas oracle, broadcasts them, and follows
//! each one until it is confirmed, fails, or is cancelled. Transactions that are not mined in time
//! are re-priced and re-broadcast with the same nonce.

mod client;
mod config;
mod metrics;
mod model;
mod persistence;
mod pricing;
mod tracker;

pub use client::{L1Client, ReceiptInfo, SendError};
pub use config::TrackerConfig;
pub use model::{
    Confirmation, PayloadSigner, SignedTx, TransactionPayload, TxFailure, TxFailureReason, TxId,
    TxState, TxStatus,
};
pub use tracker::{SubmissionTracker, TrackedTransactionHandle, TrackerError, TrackerTask};
