//! EIP-681 URI decoding.
//!
//! `ethereum:[pay-]<target>[@<chain_id>][/<function>][?<params>]`, plus the
//! `https://<host>/send/<target>...` form used by universal links.

use ethers::types::U256;
use url::Url;

use super::{
    parse_address, parse_chain_id, parse_optional_amount, DeepLinkRequest, GasOverrides,
    NativeTransferRequest, TokenTransferRequest, TransferRequest,
};
use crate::error::DeepLinkError;

const TRANSFER_FUNCTION: &str = "transfer";

pub(super) fn decode(input: &str) -> Result<DeepLinkRequest, DeepLinkError> {
    let url = Url::parse(input.trim()).map_err(|e| DeepLinkError::Malformed(e.to_string()))?;

    let body = match url.scheme() {
        "ethereum" => url.path().to_string(),
        "http" | "https" => url
            .path()
            .strip_prefix("/send/")
            .map(str::to_string)
            .ok_or_else(|| DeepLinkError::Malformed(format!("unsupported link path '{}'", url.path())))?,
        other => return Err(DeepLinkError::Malformed(format!("unsupported scheme '{}'", other))),
    };

    let body = body.strip_prefix("pay-").unwrap_or(&body);
    let (target, function) = match body.split_once('/') {
        Some((target, function)) => (target, Some(function.trim_end_matches('/'))),
        None => (body, None),
    };
    let (target, chain_id) = match target.split_once('@') {
        Some((address, chain)) => (address, Some(parse_chain_id(chain)?)),
        None => (target, None),
    };

    let query = |key: &str| -> Option<String> {
        url.query_pairs()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    };
    let amount = |key: &str| -> Result<Option<U256>, DeepLinkError> { parse_optional_amount(query(key)) };

    let transfer = match function {
        None | Some("") => TransferRequest::Native(NativeTransferRequest {
            recipient: parse_address(target)?,
            value: amount("value")?,
        }),
        Some(TRANSFER_FUNCTION) => {
            let recipient = query("address").ok_or(DeepLinkError::MissingParameter("address"))?;
            TransferRequest::Token(TokenTransferRequest {
                token: parse_address(target)?,
                recipient: parse_address(&recipient)?,
                amount: amount("uint256")?,
            })
        }
        Some(other) => return Err(DeepLinkError::UnsupportedAction(other.to_string())),
    };

    let gas = GasOverrides {
        gas: match amount("gas")? {
            Some(gas) => Some(gas),
            None => amount("gasLimit")?,
        },
        gas_price: amount("gasPrice")?,
    };

    Ok(DeepLinkRequest {
        transfer,
        chain_id,
        gas,
    })
}
