//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::types::{Address, U256};

use crate::error::{EstimationError, SubmissionError};
use crate::services::{AssetMetadataService, HeldAssets, NetworkContext, TokensService, TransactionService};
use crate::types::{GasEstimate, ResolvedAsset, TransactionDraft, TransactionId};

pub struct MockMetadata {
    decimals: Option<u32>,
    symbol: Option<String>,
    calls: AtomicUsize,
}

impl MockMetadata {
    /// `None` makes the corresponding query fail.
    pub fn new(decimals: Option<u32>, symbol: Option<&str>) -> Self {
        Self {
            decimals,
            symbol: symbol.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetMetadataService for MockMetadata {
    async fn decimals(&self, _address: Address) -> anyhow::Result<u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.decimals.ok_or_else(|| anyhow::anyhow!("execution reverted"))
    }

    async fn symbol(&self, _address: Address) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.symbol.clone().ok_or_else(|| anyhow::anyhow!("execution reverted"))
    }
}

pub struct MockTransactionService {
    estimate: Mutex<Result<GasEstimate, String>>,
    submit: Mutex<Result<TransactionId, SubmissionError>>,
    /// Times `submit` yields to the scheduler before answering
    submit_yields: AtomicUsize,
    estimate_calls: AtomicUsize,
    submitted: Mutex<Vec<TransactionDraft>>,
    cancelled: Mutex<Vec<Option<TransactionId>>>,
}

impl MockTransactionService {
    pub const DEFAULT_ESTIMATE: GasEstimate = GasEstimate {
        gas_limit: U256([21_000, 0, 0, 0]),
        gas_price: U256([20_000_000_000, 0, 0, 0]),
    };

    pub fn set_estimate(&self, estimate: Result<GasEstimate, String>) {
        *self.estimate.lock().unwrap() = estimate;
    }

    pub fn set_submit(&self, result: Result<TransactionId, SubmissionError>) {
        *self.submit.lock().unwrap() = result;
    }

    pub fn set_submit_yields(&self, yields: usize) {
        self.submit_yields.store(yields, Ordering::SeqCst);
    }

    pub fn estimate_calls(&self) -> usize {
        self.estimate_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<TransactionDraft> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<Option<TransactionId>> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl Default for MockTransactionService {
    fn default() -> Self {
        Self {
            estimate: Mutex::new(Ok(Self::DEFAULT_ESTIMATE)),
            submit: Mutex::new(Ok(TransactionId("tx-1".to_string()))),
            submit_yields: AtomicUsize::new(0),
            estimate_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TransactionService for MockTransactionService {
    async fn estimate(&self, _draft: &TransactionDraft) -> Result<GasEstimate, EstimationError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        self.estimate.lock().unwrap().clone().map_err(EstimationError)
    }

    async fn submit(&self, draft: &TransactionDraft) -> Result<TransactionId, SubmissionError> {
        self.submitted.lock().unwrap().push(draft.clone());
        for _ in 0..self.submit_yields.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        self.submit.lock().unwrap().clone()
    }

    async fn cancel(&self, id: Option<&TransactionId>) -> anyhow::Result<()> {
        self.cancelled.lock().unwrap().push(id.cloned());
        Ok(())
    }
}

pub struct MockNetwork {
    active: Mutex<u64>,
    switches: Mutex<Vec<String>>,
}

impl MockNetwork {
    pub fn new(active: u64) -> Self {
        Self {
            active: Mutex::new(active),
            switches: Mutex::new(Vec::new()),
        }
    }

    pub fn switches(&self) -> Vec<String> {
        self.switches.lock().unwrap().clone()
    }
}

impl NetworkContext for MockNetwork {
    fn active_chain_id(&self) -> u64 {
        *self.active.lock().unwrap()
    }

    fn switch_to(&self, network_id: &str) {
        if let Some(network) = crate::config::find_network_by_id(network_id) {
            *self.active.lock().unwrap() = network.chain_id;
        }
        self.switches.lock().unwrap().push(network_id.to_string());
    }
}

#[derive(Default)]
pub struct MockHeldAssets {
    removed: Mutex<Vec<(Address, U256)>>,
}

impl MockHeldAssets {
    pub fn removed(&self) -> Vec<(Address, U256)> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl HeldAssets for MockHeldAssets {
    async fn remove_collectible(&self, address: Address, token_id: U256) -> anyhow::Result<()> {
        self.removed.lock().unwrap().push((address, token_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockTokens {
    pub fail: bool,
    imported: Mutex<Vec<ResolvedAsset>>,
    ignored: Mutex<Vec<ResolvedAsset>>,
}

impl MockTokens {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn imported(&self) -> Vec<ResolvedAsset> {
        self.imported.lock().unwrap().clone()
    }

    pub fn ignored(&self) -> Vec<ResolvedAsset> {
        self.ignored.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokensService for MockTokens {
    async fn import_tokens(&self, tokens: &[ResolvedAsset]) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("tokens controller unavailable");
        }
        self.imported.lock().unwrap().extend_from_slice(tokens);
        Ok(())
    }

    async fn ignore_tokens(&self, tokens: &[ResolvedAsset]) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("tokens controller unavailable");
        }
        self.ignored.lock().unwrap().extend_from_slice(tokens);
        Ok(())
    }
}
