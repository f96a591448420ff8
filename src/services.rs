//! Collaborators consumed by the send flow.
//!
//! Every engine dependency is injected through these traits at
//! construction time; nothing reaches for global state.

use async_trait::async_trait;
use ethers::types::{Address, U256};

use crate::error::{EstimationError, SubmissionError};
use crate::notifications::Notice;
use crate::types::{GasEstimate, ResolvedAsset, TransactionDraft, TransactionId};

/// Estimation, submission and cancellation of drafts.
#[async_trait]
pub trait TransactionService: Send + Sync {
    async fn estimate(&self, draft: &TransactionDraft) -> Result<GasEstimate, EstimationError>;

    /// Sign and broadcast the draft, returning the id the service tracks it by.
    async fn submit(&self, draft: &TransactionDraft) -> Result<TransactionId, SubmissionError>;

    /// Cancel a draft that was never broadcast. `None` refers to a draft the
    /// service has not assigned an id to yet.
    async fn cancel(&self, id: Option<&TransactionId>) -> anyhow::Result<()>;
}

/// On-chain token metadata queries. Either call may fail independently.
#[async_trait]
pub trait AssetMetadataService: Send + Sync {
    async fn decimals(&self, address: Address) -> anyhow::Result<u32>;
    async fn symbol(&self, address: Address) -> anyhow::Result<String>;
}

/// The wallet's active network.
pub trait NetworkContext: Send + Sync {
    fn active_chain_id(&self) -> u64;
    fn switch_to(&self, network_id: &str);
}

/// User-facing notices. Fire and forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// The user's held assets.
#[async_trait]
pub trait HeldAssets: Send + Sync {
    async fn remove_collectible(&self, address: Address, token_id: U256) -> anyhow::Result<()>;
}

/// Tokens the wallet tracks, including ones detected automatically.
#[async_trait]
pub trait TokensService: Send + Sync {
    async fn import_tokens(&self, tokens: &[ResolvedAsset]) -> anyhow::Result<()>;
    async fn ignore_tokens(&self, tokens: &[ResolvedAsset]) -> anyhow::Result<()>;
}
