//! JSON-RPC backed collaborators used by the command line dry run.
//!
//! Token metadata and gas estimation go to the node for whichever network
//! is active. Submission is refused: signing is not part of this crate.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::abi::{Function, Param, ParamType, StateMutability, Token};
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use tracing::{debug, info, warn};

use crate::config::{self, Config};
use crate::error::{EstimationError, SubmissionError};
use crate::services::{AssetMetadataService, HeldAssets, NetworkContext, TransactionService};
use crate::types::{GasEstimate, TransactionDraft, TransactionId, TransactionKind};

/// Gas limit of a plain value transfer
const NATIVE_TRANSFER_GAS: u64 = 21_000;
/// Used when no sender is known and the node cannot simulate the call
const TOKEN_TRANSFER_GAS: u64 = 65_000;
const COLLECTIBLE_TRANSFER_GAS: u64 = 100_000;

/// Gas limit to use instead of `eth_estimateGas`, if the draft cannot be simulated.
fn fixed_gas_limit(draft: &TransactionDraft) -> Option<U256> {
    if draft.recipient.is_none() {
        return Some(U256::from(NATIVE_TRANSFER_GAS));
    }
    match (draft.from, draft.transaction_kind()) {
        (Some(_), _) => None,
        (None, TransactionKind::NativeTransfer) => Some(U256::from(NATIVE_TRANSFER_GAS)),
        (None, TransactionKind::TokenTransfer) => Some(U256::from(TOKEN_TRANSFER_GAS)),
        (None, TransactionKind::CollectibleTransfer) => Some(U256::from(COLLECTIBLE_TRANSFER_GAS)),
    }
}

pub struct RpcSession {
    active_chain_id: RwLock<u64>,
    custom_rpcs: HashMap<u64, String>,
    fallback_rpc: String,
}

impl RpcSession {
    pub fn new(config: &Config, custom_rpcs: HashMap<u64, String>) -> Self {
        Self {
            active_chain_id: RwLock::new(config.chain_id),
            custom_rpcs,
            fallback_rpc: config.rpc_url.clone(),
        }
    }

    fn rpc_url(&self, chain_id: u64) -> String {
        if let Some(url) = self.custom_rpcs.get(&chain_id).filter(|u| !u.is_empty()) {
            return url.clone();
        }
        config::find_network_by_chain_id(chain_id)
            .map(|n| n.default_rpc.to_string())
            .unwrap_or_else(|| self.fallback_rpc.clone())
    }

    fn provider(&self) -> Result<Provider<Http>> {
        let url = self.rpc_url(self.active_chain_id());
        Provider::<Http>::try_from(url.as_str()).map_err(|e| anyhow!("invalid RPC url {}: {}", url, e))
    }

    async fn call_view(&self, token: Address, function: &Function) -> Result<Vec<Token>> {
        let calldata = function.encode_input(&[])?;
        let tx = TransactionRequest::new().to(token).data(calldata);
        let result = self.provider()?.call(&tx.into(), None).await?;
        if result.is_empty() {
            return Err(anyhow!("{}() returned no data", function.name));
        }
        Ok(function.decode_output(&result)?)
    }
}

fn view_function(name: &str, output: ParamType) -> Function {
    Function {
        name: name.to_string(),
        inputs: vec![],
        outputs: vec![Param {
            name: "".to_string(),
            kind: output,
            internal_type: None,
        }],
        constant: None,
        state_mutability: StateMutability::View,
    }
}

impl NetworkContext for RpcSession {
    fn active_chain_id(&self) -> u64 {
        match self.active_chain_id.read() {
            Ok(id) => *id,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn switch_to(&self, network_id: &str) {
        let Some(network) = config::find_network_by_id(network_id) else {
            return;
        };
        let mut active = match self.active_chain_id.write() {
            Ok(active) => active,
            Err(poisoned) => poisoned.into_inner(),
        };
        *active = network.chain_id;
        info!("Active network is now {}", network.label);
    }
}

#[async_trait]
impl AssetMetadataService for RpcSession {
    async fn decimals(&self, address: Address) -> Result<u32> {
        let tokens = self.call_view(address, &view_function("decimals", ParamType::Uint(8))).await?;
        match tokens.first() {
            Some(Token::Uint(value)) if *value <= U256::from(u8::MAX) => Ok(value.as_u32()),
            other => Err(anyhow!("unexpected decimals() output {:?}", other)),
        }
    }

    async fn symbol(&self, address: Address) -> Result<String> {
        match self.call_view(address, &view_function("symbol", ParamType::String)).await {
            Ok(tokens) => match tokens.into_iter().next() {
                Some(Token::String(symbol)) if !symbol.is_empty() => Ok(symbol),
                other => Err(anyhow!("unexpected symbol() output {:?}", other)),
            },
            Err(string_err) => {
                // Some older tokens return bytes32
                debug!("symbol() as string failed ({}), trying bytes32", string_err);
                let tokens = self
                    .call_view(address, &view_function("symbol", ParamType::FixedBytes(32)))
                    .await?;
                match tokens.into_iter().next() {
                    Some(Token::FixedBytes(bytes)) => {
                        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                        let symbol = String::from_utf8(bytes[..end].to_vec())?;
                        if symbol.is_empty() {
                            Err(anyhow!("empty symbol"))
                        } else {
                            Ok(symbol)
                        }
                    }
                    other => Err(anyhow!("unexpected symbol() output {:?}", other)),
                }
            }
        }
    }
}

#[async_trait]
impl TransactionService for RpcSession {
    async fn estimate(&self, draft: &TransactionDraft) -> Result<GasEstimate, EstimationError> {
        let provider = self.provider().map_err(|e| EstimationError(e.to_string()))?;
        let gas_price = provider
            .get_gas_price()
            .await
            .map_err(|e| EstimationError(e.to_string()))?;

        let gas_limit = if let Some(fixed) = fixed_gas_limit(draft) {
            if draft.recipient.is_some() {
                warn!("No sender account configured, using fixed gas limit {}", fixed);
            }
            fixed
        } else {
            let tx = draft.to_request().map_err(|e| EstimationError(e.to_string()))?;
            provider
                .estimate_gas(&tx.into(), None)
                .await
                .map_err(|e| EstimationError(e.to_string()))?
        };

        Ok(GasEstimate { gas_limit, gas_price })
    }

    async fn submit(&self, _draft: &TransactionDraft) -> Result<TransactionId, SubmissionError> {
        Err(SubmissionError::SignerUnavailable(
            "dry run: no signer is configured".to_string(),
        ))
    }

    async fn cancel(&self, id: Option<&TransactionId>) -> Result<()> {
        debug!("Dry run cancel for {:?}", id);
        Ok(())
    }
}

#[async_trait]
impl HeldAssets for RpcSession {
    async fn remove_collectible(&self, address: Address, token_id: U256) -> Result<()> {
        debug!("Dry run: not removing collectible {:?} #{}", address, token_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DraftAsset, ResolvedAsset};

    fn session(chain_id: u64) -> RpcSession {
        let mut custom = HashMap::new();
        custom.insert(137, "https://polygon.example".to_string());
        RpcSession::new(&Config::new("http://127.0.0.1:8545".to_string(), chain_id), custom)
    }

    #[test]
    fn test_rpc_url_prefers_custom_then_table_then_fallback() {
        let session = session(1);
        assert_eq!(session.rpc_url(137), "https://polygon.example");
        assert_eq!(session.rpc_url(1), "https://ethereum-rpc.publicnode.com");
        assert_eq!(session.rpc_url(31337), "http://127.0.0.1:8545");
    }

    #[test]
    fn test_switch_to_known_network() {
        let session = session(1);
        session.switch_to("base");
        assert_eq!(session.active_chain_id(), 8453);
        session.switch_to("nowhere");
        assert_eq!(session.active_chain_id(), 8453);
    }

    #[test]
    fn test_view_function_selectors() {
        let decimals = view_function("decimals", ParamType::Uint(8)).encode_input(&[]).unwrap();
        assert_eq!(decimals, vec![0x31, 0x3c, 0xe5, 0x67]);
        let symbol = view_function("symbol", ParamType::String).encode_input(&[]).unwrap();
        assert_eq!(symbol, vec![0x95, 0xd8, 0x9b, 0x41]);
    }

    #[test]
    fn test_fixed_gas_limit_without_sender() {
        let mut draft = TransactionDraft::empty();
        assert_eq!(fixed_gas_limit(&draft), Some(U256::from(NATIVE_TRANSFER_GAS)));

        draft.recipient = Some(Address::repeat_byte(0x22));
        draft.asset = DraftAsset::Fungible(ResolvedAsset {
            address: Address::repeat_byte(0x11),
            symbol: "TKN".to_string(),
            decimals: 2,
        });
        assert_eq!(fixed_gas_limit(&draft), Some(U256::from(TOKEN_TRANSFER_GAS)));

        draft.from = Some(Address::repeat_byte(0x33));
        assert_eq!(fixed_gas_limit(&draft), None);
    }

    #[tokio::test]
    async fn test_submit_is_refused() {
        let err = session(1).submit(&TransactionDraft::empty()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::SignerUnavailable(_)));
    }
}
