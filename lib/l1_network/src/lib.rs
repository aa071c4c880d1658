//! Classification of the L1 network the adapter runs against, and the network-specific
//! operating configuration derived from it.

mod classifier;
mod family;
mod profile;
mod resolver;

pub use classifier::classify;
pub use family::{
    BSC_MAINNET_CHAIN_ID, BSC_TESTNET_CHAIN_ID, ETHEREUM_MAINNET_CHAIN_ID, GOERLI_CHAIN_ID,
    HOLESKY_CHAIN_ID, HOODI_CHAIN_ID, NetworkFamily, SEPOLIA_CHAIN_ID,
};
pub use profile::{GWEI, InvalidProfile, NetworkProfile};
pub use resolver::{
    CONFIG_TABLE_VERSION, DEFAULT_MAX_ATTEMPTS, DEFAULT_STUCK_TIMEOUT_BLOCKS, L1OperatingConfig,
    OperatingOverrides, resolve,
};
