use std::env;

/// A predefined EVM-compatible network with label, chain ID, network id, native token, and default RPC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvmNetwork {
    pub label: &'static str,
    pub chain_id: u64,
    /// Identifier the network context switches by
    pub network_id: &'static str,
    pub native_token: &'static str,
    pub default_rpc: &'static str,
}

impl EvmNetwork {
    pub const fn new(
        label: &'static str,
        chain_id: u64,
        network_id: &'static str,
        native_token: &'static str,
        default_rpc: &'static str,
    ) -> Self {
        Self {
            label,
            chain_id,
            network_id,
            native_token,
            default_rpc,
        }
    }
}

/// Networks a deep link may request.
pub const NETWORKS: &[EvmNetwork] = &[
    EvmNetwork::new("Ethereum Main Network", 1, "mainnet", "ETH", "https://ethereum-rpc.publicnode.com"),
    EvmNetwork::new("Sepolia", 11155111, "sepolia", "ETH", "https://ethereum-sepolia-rpc.publicnode.com"),
    EvmNetwork::new("Hoodi", 560048, "hoodi", "ETH", "https://rpc.hoodi.ethpandaops.io"),
    EvmNetwork::new("Optimism", 10, "optimism", "ETH", "https://mainnet.optimism.io"),
    EvmNetwork::new("Base", 8453, "base", "ETH", "https://mainnet.base.org"),
    EvmNetwork::new("Polygon", 137, "polygon", "POL", "https://polygon-rpc.com"),
    EvmNetwork::new("Linea", 59144, "linea", "ETH", "https://rpc.linea.build"),
    EvmNetwork::new("Gnosis Chain", 100, "gnosis", "xDAI", "https://rpc.gnosischain.com"),
    EvmNetwork::new("BNB Chain", 56, "bsc", "BNB", "https://bsc-dataseed.binance.org"),
    EvmNetwork::new("Avalanche C-Chain", 43114, "avalanche", "AVAX", "https://avalanche-c-chain-rpc.publicnode.com"),
];

/// Find a network by chain ID
pub fn find_network_by_chain_id(chain_id: u64) -> Option<&'static EvmNetwork> {
    NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Find a network by its switchable identifier
pub fn find_network_by_id(network_id: &str) -> Option<&'static EvmNetwork> {
    NETWORKS.iter().find(|n| n.network_id == network_id)
}

/// Get the block explorer URL for a given chain ID
pub fn get_block_explorer_url(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://etherscan.io"),
        11155111 => Some("https://sepolia.etherscan.io"),
        560048 => Some("https://hoodi.ethpandaops.io"),
        10 => Some("https://optimistic.etherscan.io"),
        8453 => Some("https://basescan.org"),
        137 => Some("https://polygonscan.com"),
        59144 => Some("https://lineascan.build"),
        100 => Some("https://gnosisscan.io"),
        56 => Some("https://bscscan.com"),
        43114 => Some("https://snowtrace.io"),
        _ => None,
    }
}

/// Get the full URL to view an address on the block explorer
pub fn get_address_explorer_url(chain_id: u64, address: &str) -> Option<String> {
    get_block_explorer_url(chain_id).map(|base| format!("{}/address/{}", base, address))
}

#[derive(Clone, Debug)]
pub struct Config {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Reject deep links whose chain id is not in [`NETWORKS`] instead of ignoring the chain id
    pub strict_chain_ids: bool,
    /// How long the network-switch notice stays up
    pub network_notice_ms: u64,
    /// How long the deep-link failure notice stays up
    pub failure_notice_ms: u64,
}

impl Config {
    pub fn new(rpc_url: String, chain_id: u64) -> Self {
        Self {
            rpc_url,
            chain_id,
            strict_chain_ids: false,
            network_notice_ms: 5000,
            failure_notice_ms: 2000,
        }
    }

    pub fn from_network(network: &EvmNetwork) -> Self {
        Self::new(network.default_rpc.to_string(), network.chain_id)
    }

    /// Build config for `chain_id`, letting `SENDFLOW_CHAIN_ID`,
    /// `SENDFLOW_RPC_URL` and `SENDFLOW_STRICT_CHAIN_IDS` override it.
    pub fn from_env(chain_id: u64, custom_rpc: Option<&str>) -> Self {
        let chain_id = env::var("SENDFLOW_CHAIN_ID")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(chain_id);

        let rpc_url = env::var("SENDFLOW_RPC_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| custom_rpc.map(str::to_string))
            .or_else(|| find_network_by_chain_id(chain_id).map(|n| n.default_rpc.to_string()))
            .unwrap_or_else(|| "http://127.0.0.1:8545".to_string());

        let mut config = Self::new(rpc_url, chain_id);
        config.strict_chain_ids = env::var("SENDFLOW_STRICT_CHAIN_IDS")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(false);
        config
    }

    pub fn native_token(&self) -> &str {
        find_network_by_chain_id(self.chain_id)
            .map(|n| n.native_token)
            .unwrap_or("ETH")
    }

    pub fn network_label(&self) -> &str {
        find_network_by_chain_id(self.chain_id)
            .map(|n| n.label)
            .unwrap_or("Unknown")
    }
}

impl Default for Config {
    fn default() -> Self {
        if let Some(mainnet) = find_network_by_chain_id(1) {
            Self::from_network(mainnet)
        } else {
            Self::new("https://ethereum-rpc.publicnode.com".to_string(), 1)
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
