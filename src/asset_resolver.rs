//! Token metadata resolution with a three-tier fallback:
//! static registry, then tokens the wallet already tracks, then the chain.

use std::sync::Arc;

use ethers::types::Address;
use tracing::{debug, warn};

use crate::error::AssetResolutionError;
use crate::services::AssetMetadataService;
use crate::token_registry;
use crate::types::ResolvedAsset;
use crate::utils;

/// Symbol used when a contract does not answer `symbol()`.
pub const FALLBACK_SYMBOL: &str = "ERC20";

pub struct AssetResolver {
    known_tokens: Vec<ResolvedAsset>,
    metadata: Arc<dyn AssetMetadataService>,
}

impl AssetResolver {
    pub fn new(known_tokens: Vec<ResolvedAsset>, metadata: Arc<dyn AssetMetadataService>) -> Self {
        Self {
            known_tokens,
            metadata,
        }
    }

    pub fn known_tokens(&self) -> &[ResolvedAsset] {
        &self.known_tokens
    }

    /// Resolve `address` to its metadata. First match wins; tiers are never merged.
    ///
    /// Fails only when the remote `decimals()` query fails, since no amount
    /// can be scaled without it. A failing `symbol()` falls back to
    /// [`FALLBACK_SYMBOL`]. Nothing is persisted.
    pub async fn resolve(&self, address: Address) -> Result<ResolvedAsset, AssetResolutionError> {
        if let Some(asset) = token_registry::lookup(&address) {
            debug!("Resolved {} from static registry", asset.symbol);
            return Ok(asset);
        }

        if let Some(asset) = self.known_tokens.iter().find(|t| t.address == address) {
            debug!("Resolved {} from tracked tokens", asset.symbol);
            return Ok(asset.clone());
        }

        let decimals = self.metadata.decimals(address).await.map_err(|e| {
            warn!("decimals() query failed for {:?}: {}", address, e);
            AssetResolutionError {
                address: utils::checksum(&address),
                reason: e.to_string(),
            }
        })?;

        let symbol = match self.metadata.symbol(address).await {
            Ok(symbol) => symbol,
            Err(e) => {
                warn!("symbol() query failed for {:?}, using {}: {}", address, FALLBACK_SYMBOL, e);
                FALLBACK_SYMBOL.to_string()
            }
        };

        Ok(ResolvedAsset {
            address,
            symbol,
            decimals,
        })
    }
}
