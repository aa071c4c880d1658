use serde::{Deserialize, Serialize};
use std::fmt;

pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;
pub const GOERLI_CHAIN_ID: u64 = 5;
pub const HOLESKY_CHAIN_ID: u64 = 17_000;
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const HOODI_CHAIN_ID: u64 = 560_048;
pub const BSC_MAINNET_CHAIN_ID: u64 = 56;
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;

/// Kind of L1 network the adapter talks to.
///
/// The set is closed on purpose: every decision that depends on the network goes through an
/// exhaustive `match`, and unknown chains end up in [`NetworkFamily::Generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkFamily {
    EthereumMainnet,
    EthereumTestnet,
    BscMainnet,
    /// BSC Testnet (Chapel)
    BscTestnet,
    Generic,
}

impl NetworkFamily {
    /// Looks up the family for a chain id from the static table of known L1s.
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            ETHEREUM_MAINNET_CHAIN_ID => Some(Self::EthereumMainnet),
            GOERLI_CHAIN_ID | HOLESKY_CHAIN_ID | SEPOLIA_CHAIN_ID | HOODI_CHAIN_ID => {
                Some(Self::EthereumTestnet)
            }
            BSC_MAINNET_CHAIN_ID => Some(Self::BscMainnet),
            BSC_TESTNET_CHAIN_ID => Some(Self::BscTestnet),
            _ => None,
        }
    }

    /// Whether nodes of the family are expected to return well-formed JSON-RPC responses.
    pub fn is_ethereum(self) -> bool {
        matches!(self, Self::EthereumMainnet | Self::EthereumTestnet)
    }

    pub fn is_bsc(self) -> bool {
        matches!(self, Self::BscMainnet | Self::BscTestnet)
    }

    pub fn native_token_symbol(self) -> &'static str {
        match self {
            Self::EthereumMainnet | Self::EthereumTestnet | Self::Generic => "ETH",
            Self::BscMainnet | Self::BscTestnet => "BNB",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EthereumMainnet => "ethereum-mainnet",
            Self::EthereumTestnet => "ethereum-testnet",
            Self::BscMainnet => "bsc-mainnet",
            Self::BscTestnet => "bsc-testnet",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for NetworkFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
