//! Deep-link send flow for EVM wallets.
//!
//! An inbound deep link is decoded into a [`deeplink::DeepLinkRequest`],
//! turned into a [`types::TransactionDraft`] by the [`deeplink::DeepLinkParser`]
//! (resolving token metadata and switching networks on the way), and then
//! driven through review, submission or cancellation by a
//! [`send_flow::SendFlow`].

pub mod asset_resolver;
pub mod config;
pub mod deeplink;
pub mod detected_tokens;
pub mod error;
pub mod network_switch;
pub mod notifications;
pub mod operation_log;
pub mod rpc;
pub mod send_flow;
pub mod services;
pub mod token_registry;
pub mod types;
pub mod user_settings;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
