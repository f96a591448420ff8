//! Common types shared across modules.

use std::fmt;

use ethers::abi::{Function, Param, ParamType, StateMutability, Token};
use ethers::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils;

/// Decimals of every EVM native currency unit (wei → ether).
pub const NATIVE_DECIMALS: u32 = 18;

/// Token metadata produced by the asset resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAsset {
    pub address: Address,
    pub symbol: String,
    pub decimals: u32,
}

/// A single non-fungible token instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collectible {
    pub address: Address,
    pub token_id: U256,
    pub name: Option<String>,
}

/// What the draft is moving.
///
/// Token metadata only exists for token-backed variants, so a native draft
/// can never carry a selected asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftAsset {
    Native,
    Fungible(ResolvedAsset),
    NonFungible(Collectible),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetType {
    Native,
    FungibleToken,
    NonFungibleToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    NativeTransfer,
    TokenTransfer,
    CollectibleTransfer,
}

/// Identifier assigned by the transaction service once a draft is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a gas estimation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimate {
    pub gas_limit: U256,
    pub gas_price: U256,
}

/// Lifecycle of a send flow. `Submitted` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Loading,
    Edit,
    Review,
    Confirming,
    Submitted,
    Cancelled,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Submitted | LifecycleState::Cancelled)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::Loading => "LOADING",
            LifecycleState::Edit => "EDIT",
            LifecycleState::Review => "REVIEW",
            LifecycleState::Confirming => "CONFIRMING",
            LifecycleState::Submitted => "SUBMITTED",
            LifecycleState::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Editor modes the view can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Edit,
    Review,
}

/// The in-progress transaction owned by a send flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub asset: DraftAsset,
    /// Sending account, when the wallet has selected one.
    pub from: Option<Address>,
    pub recipient: Option<Address>,
    /// Amount in the asset's smallest unit.
    pub amount: U256,
    pub readable_amount: String,
    pub gas_limit: Option<U256>,
    pub gas_price: Option<U256>,
    pub id: Option<TransactionId>,
}

impl Default for TransactionDraft {
    fn default() -> Self {
        Self::empty()
    }
}

impl TransactionDraft {
    /// A fresh native draft with nothing filled in.
    pub fn empty() -> Self {
        Self {
            asset: DraftAsset::Native,
            from: None,
            recipient: None,
            amount: U256::zero(),
            readable_amount: "0".to_string(),
            gas_limit: None,
            gas_price: None,
            id: None,
        }
    }

    pub fn asset_type(&self) -> AssetType {
        match self.asset {
            DraftAsset::Native => AssetType::Native,
            DraftAsset::Fungible(_) => AssetType::FungibleToken,
            DraftAsset::NonFungible(_) => AssetType::NonFungibleToken,
        }
    }

    pub fn transaction_kind(&self) -> TransactionKind {
        match self.asset {
            DraftAsset::Native => TransactionKind::NativeTransfer,
            DraftAsset::Fungible(_) => TransactionKind::TokenTransfer,
            DraftAsset::NonFungible(_) => TransactionKind::CollectibleTransfer,
        }
    }

    pub fn selected_asset(&self) -> Option<&ResolvedAsset> {
        match &self.asset {
            DraftAsset::Fungible(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn symbol<'a>(&'a self, native_symbol: &'a str) -> &'a str {
        match &self.asset {
            DraftAsset::Native => native_symbol,
            DraftAsset::Fungible(asset) => &asset.symbol,
            DraftAsset::NonFungible(collectible) => collectible.name.as_deref().unwrap_or("NFT"),
        }
    }

    /// EIP-55 checksummed recipient.
    pub fn recipient_checksum(&self) -> Option<String> {
        self.recipient.as_ref().map(utils::checksum)
    }

    pub fn has_gas(&self) -> bool {
        self.gas_limit.is_some() && self.gas_price.is_some()
    }

    /// Overwrite gas limit and price with a fresh estimate.
    pub fn apply_estimate(&mut self, estimate: GasEstimate) {
        self.gas_limit = Some(estimate.gas_limit);
        self.gas_price = Some(estimate.gas_price);
    }

    /// Fill only the gas fields that were not supplied explicitly.
    pub fn fill_missing_gas(&mut self, estimate: GasEstimate) {
        self.gas_limit.get_or_insert(estimate.gas_limit);
        self.gas_price.get_or_insert(estimate.gas_price);
    }

    /// Set the amount and recompute its readable form.
    pub fn set_amount(&mut self, amount: U256) {
        self.amount = amount;
        self.readable_amount = match &self.asset {
            DraftAsset::Native => utils::format_native(amount),
            DraftAsset::Fungible(asset) => utils::format_token_amount(amount, asset.decimals),
            DraftAsset::NonFungible(_) => amount.to_string(),
        };
    }

    /// Build the on-chain transaction request this draft describes.
    ///
    /// Token transfers are addressed to the token contract with zero value
    /// and the transfer encoded in calldata.
    pub fn to_request(&self) -> anyhow::Result<TransactionRequest> {
        let recipient = self
            .recipient
            .ok_or_else(|| anyhow::anyhow!("draft has no recipient"))?;

        let mut tx = match &self.asset {
            DraftAsset::Native => TransactionRequest::new().to(recipient).value(self.amount),
            DraftAsset::Fungible(asset) => {
                let calldata = erc20_transfer_function()
                    .encode_input(&[Token::Address(recipient), Token::Uint(self.amount)])?;
                TransactionRequest::new()
                    .to(asset.address)
                    .value(U256::zero())
                    .data(calldata)
            }
            DraftAsset::NonFungible(collectible) => {
                let from = self
                    .from
                    .ok_or_else(|| anyhow::anyhow!("collectible transfer requires a sender"))?;
                let calldata = erc721_transfer_from_function().encode_input(&[
                    Token::Address(from),
                    Token::Address(recipient),
                    Token::Uint(collectible.token_id),
                ])?;
                TransactionRequest::new()
                    .to(collectible.address)
                    .value(U256::zero())
                    .data(calldata)
            }
        };

        if let Some(from) = self.from {
            tx = tx.from(from);
        }
        if let Some(gas) = self.gas_limit {
            tx = tx.gas(gas);
        }
        if let Some(gas_price) = self.gas_price {
            tx = tx.gas_price(gas_price);
        }
        Ok(tx)
    }
}

fn param(name: &str, kind: ParamType) -> Param {
    Param {
        name: name.to_string(),
        kind,
        internal_type: None,
    }
}

/// ERC-20 `transfer(address,uint256)`
pub(crate) fn erc20_transfer_function() -> Function {
    Function {
        name: "transfer".to_string(),
        inputs: vec![param("to", ParamType::Address), param("value", ParamType::Uint(256))],
        outputs: vec![param("", ParamType::Bool)],
        constant: None,
        state_mutability: StateMutability::NonPayable,
    }
}

/// ERC-721 `transferFrom(address,address,uint256)`
pub(crate) fn erc721_transfer_from_function() -> Function {
    Function {
        name: "transferFrom".to_string(),
        inputs: vec![
            param("from", ParamType::Address),
            param("to", ParamType::Address),
            param("tokenId", ParamType::Uint(256)),
        ],
        outputs: vec![],
        constant: None,
        state_mutability: StateMutability::NonPayable,
    }
}
