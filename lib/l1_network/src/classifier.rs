use crate::family::NetworkFamily;
use crate::profile::NetworkProfile;

const BSC_URL_MARKERS: [&str; 3] = ["bsc", "binance", "bnbchain"];
const TESTNET_URL_MARKERS: [&str; 2] = ["test", "chapel"];

/// Determines the [`NetworkProfile`] for an L1 chain.
///
/// The chain id is the primary signal. The RPC URL is only consulted when the chain id is not
/// in the table of known networks, and it can only ever point to a BSC family: an unknown chain
/// is never treated as a compliant Ethereum chain. When nothing matches, the conservative
/// [`NetworkFamily::Generic`] profile is returned.
pub fn classify(chain_id: u64, rpc_url_hint: Option<&str>) -> NetworkProfile {
    let family = NetworkFamily::from_chain_id(chain_id)
        .or_else(|| rpc_url_hint.and_then(family_from_url))
        .unwrap_or_else(|| {
            tracing::warn!(
                chain_id,
                rpc_url_hint,
                "unknown L1 network, falling back to conservative generic profile"
            );
            NetworkFamily::Generic
        });

    NetworkProfile::for_family(chain_id, family)
}

fn family_from_url(url: &str) -> Option<NetworkFamily> {
    let url = url.to_ascii_lowercase();
    if !BSC_URL_MARKERS.iter().any(|marker| url.contains(marker)) {
        return None;
    }
    if TESTNET_URL_MARKERS.iter().any(|marker| url.contains(marker)) {
        Some(NetworkFamily::BscTestnet)
    } else {
        Some(NetworkFamily::BscMainnet)
    }
}
