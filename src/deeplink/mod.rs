//! Inbound deep link transaction requests.
//!
//! Requests arrive either as a flat JSON payload from the link router
//! ([`RawDeepLinkPayload`]) or as an EIP-681 URI ([`DeepLinkRequest::from_uri`]).
//! Both decode into [`DeepLinkRequest`], which [`DeepLinkParser`] turns
//! into a [`crate::types::TransactionDraft`].

mod parser;
mod uri;

pub use parser::DeepLinkParser;

use std::collections::HashMap;

use ethers::types::{Address, U256};
use serde::Deserialize;
use serde_json::Value;

use crate::error::DeepLinkError;
use crate::utils;

pub const ACTION_SEND_NATIVE: &str = "send-native";
pub const ACTION_SEND_TOKEN: &str = "send-token";
/// Older links name the native send after ether
const ACTION_SEND_ETH: &str = "send-eth";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GasOverrides {
    pub gas: Option<U256>,
    pub gas_price: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTransferRequest {
    pub recipient: Address,
    /// Amount in wei
    pub value: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransferRequest {
    pub token: Address,
    pub recipient: Address,
    /// Amount in the token's smallest unit
    pub amount: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRequest {
    Native(NativeTransferRequest),
    Token(TokenTransferRequest),
}

/// A validated deep link request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLinkRequest {
    pub transfer: TransferRequest,
    pub chain_id: Option<u64>,
    pub gas: GasOverrides,
}

impl DeepLinkRequest {
    pub fn native(recipient: Address, value: Option<U256>) -> Self {
        Self {
            transfer: TransferRequest::Native(NativeTransferRequest { recipient, value }),
            chain_id: None,
            gas: GasOverrides::default(),
        }
    }

    pub fn token(token: Address, recipient: Address, amount: Option<U256>) -> Self {
        Self {
            transfer: TransferRequest::Token(TokenTransferRequest {
                token,
                recipient,
                amount,
            }),
            chain_id: None,
            gas: GasOverrides::default(),
        }
    }

    pub fn on_chain(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_gas(mut self, gas: Option<U256>, gas_price: Option<U256>) -> Self {
        self.gas = GasOverrides { gas, gas_price };
        self
    }

    /// Decode an EIP-681 style URI.
    pub fn from_uri(input: &str) -> Result<Self, DeepLinkError> {
        uri::decode(input)
    }
}

/// The flat payload shape handed over by the link router.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDeepLinkPayload {
    pub target_address: String,
    pub action: String,
    #[serde(default)]
    pub chain_id: Option<Value>,
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub parameters: Option<HashMap<String, Value>>,
}

impl RawDeepLinkPayload {
    fn param(&self, keys: &[&str]) -> Option<String> {
        let parameters = self.parameters.as_ref()?;
        keys.iter().find_map(|key| match parameters.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

impl TryFrom<RawDeepLinkPayload> for DeepLinkRequest {
    type Error = DeepLinkError;

    fn try_from(payload: RawDeepLinkPayload) -> Result<Self, Self::Error> {
        let transfer = match payload.action.as_str() {
            ACTION_SEND_NATIVE | ACTION_SEND_ETH => TransferRequest::Native(NativeTransferRequest {
                recipient: parse_address(&payload.target_address)?,
                value: parse_optional_amount(payload.param(&["value"]))?,
            }),
            ACTION_SEND_TOKEN => {
                let recipient = payload
                    .param(&["address"])
                    .ok_or(DeepLinkError::MissingParameter("address"))?;
                TransferRequest::Token(TokenTransferRequest {
                    token: parse_address(&payload.target_address)?,
                    recipient: parse_address(&recipient)?,
                    amount: parse_optional_amount(payload.param(&["tokenAmount", "uint256"]))?,
                })
            }
            other => return Err(DeepLinkError::UnsupportedAction(other.to_string())),
        };

        let chain_id = match &payload.chain_id {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.as_u64().ok_or_else(|| DeepLinkError::Malformed(format!("chain id {}", n)))?),
            Some(Value::String(s)) => Some(parse_chain_id(s)?),
            Some(other) => return Err(DeepLinkError::Malformed(format!("chain id {}", other))),
        };

        let gas = GasOverrides {
            gas: parse_optional_amount(payload.param(&["gas", "gasLimit"]))?,
            gas_price: parse_optional_amount(payload.param(&["gasPrice"]))?,
        };

        Ok(Self {
            transfer,
            chain_id,
            gas,
        })
    }
}

fn parse_address(input: &str) -> Result<Address, DeepLinkError> {
    utils::parse_address(input).ok_or_else(|| DeepLinkError::InvalidAddress(input.to_string()))
}

fn parse_optional_amount(input: Option<String>) -> Result<Option<U256>, DeepLinkError> {
    input
        .map(|raw| utils::parse_integer_amount(&raw).ok_or(DeepLinkError::InvalidAmount(raw)))
        .transpose()
}

/// Chain ids appear as decimal or `0x` hex.
fn parse_chain_id(input: &str) -> Result<u64, DeepLinkError> {
    let trimmed = input.trim();
    let parsed = match trimmed.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse().ok(),
    };
    parsed.ok_or_else(|| DeepLinkError::Malformed(format!("chain id '{}'", trimmed)))
}
