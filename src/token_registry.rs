//! Static registry of well-known token contracts.
//!
//! First tier of asset resolution: always available, no I/O.

use ethers::types::Address;

use crate::types::ResolvedAsset;
use crate::utils;

#[derive(Clone, Debug)]
pub struct RegistryToken {
    pub address: &'static str,
    pub symbol: &'static str,
    pub decimals: u32,
}

impl RegistryToken {
    pub const fn new(address: &'static str, symbol: &'static str, decimals: u32) -> Self {
        Self {
            address,
            symbol,
            decimals,
        }
    }
}

/// Ethereum mainnet contracts, checksummed.
pub const REGISTRY: &[RegistryToken] = &[
    RegistryToken::new("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC", 6),
    RegistryToken::new("0xdAC17F958D2ee523a2206206994597C13D831ec7", "USDT", 6),
    RegistryToken::new("0x6B175474E89094C44Da98b954EedeAC495271d0F", "DAI", 18),
    RegistryToken::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "WETH", 18),
    RegistryToken::new("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599", "WBTC", 8),
    RegistryToken::new("0x514910771AF9Ca656af840dff83E8264EcF986CA", "LINK", 18),
    RegistryToken::new("0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984", "UNI", 18),
    RegistryToken::new("0x7Fc66500c84A76Ad7e9c93437bFc5Ac33E2DDaE9", "AAVE", 18),
    RegistryToken::new("0x9f8F72aA9304c8B593d555F12eF6589cC3A579A2", "MKR", 18),
];

/// Look up a token by address.
pub fn lookup(address: &Address) -> Option<ResolvedAsset> {
    REGISTRY.iter().find_map(|entry| {
        let entry_address = utils::parse_address(entry.address)?;
        (entry_address == *address).then(|| ResolvedAsset {
            address: entry_address,
            symbol: entry.symbol.to_string(),
            decimals: entry.decimals,
        })
    })
}
