//! Error types for the send flow.
//!
//! Parse-time errors (`DeepLinkError`) abort draft construction entirely.
//! Lifecycle errors (`FlowError`) are raised at the orchestrator boundary
//! after a draft exists.

use thiserror::Error;

use crate::types::LifecycleState;

/// Every resolution tier failed to produce token decimals.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not resolve decimals for token {address}: {reason}")]
pub struct AssetResolutionError {
    pub address: String,
    pub reason: String,
}

/// Gas limit / gas price estimation failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("gas estimation failed: {0}")]
pub struct EstimationError(pub String);

/// The transaction service rejected or failed to broadcast the draft.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("no signer available: {0}")]
    SignerUnavailable(String),
}

/// Failures while turning an inbound deep link into a draft.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeepLinkError {
    #[error("unsupported deep link action '{0}'")]
    UnsupportedAction(String),
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("missing deep link parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("malformed deep link: {0}")]
    Malformed(String),
    #[error("chain id {0} does not match any known network")]
    UnknownChain(u64),
    #[error(transparent)]
    AssetResolution(#[from] AssetResolutionError),
    #[error(transparent)]
    Estimation(#[from] EstimationError),
}

/// Errors surfaced by [`crate::send_flow::SendFlow`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: LifecycleState,
    },
    #[error("draft is not ready: {0}")]
    DraftNotReady(&'static str),
    #[error(transparent)]
    DeepLink(#[from] DeepLinkError),
    #[error(transparent)]
    Estimation(#[from] EstimationError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("transaction service error: {0}")]
    Service(String),
}
