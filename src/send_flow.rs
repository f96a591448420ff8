//! Send flow lifecycle orchestration.
//!
//! A [`SendFlow`] owns exactly one [`TransactionDraft`] and walks it through
//! `LOADING → EDIT ⇄ REVIEW → CONFIRMING → SUBMITTED`, with `CANCELLED`
//! reachable from every non-terminal state. The view layer observes state
//! through [`SendFlow::subscribe`] and mutates the draft only through
//! [`SendFlow::update_draft`].
//!
//! All methods take `&self` so overlapping user actions can be polled on the
//! same event loop. The inner lock is never held across a service call; the
//! state is re-checked after every await instead.

use std::future::Future;
use std::sync::Arc;

use ethers::types::Address;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::asset_resolver::AssetResolver;
use crate::config::Config;
use crate::deeplink::{DeepLinkParser, DeepLinkRequest};
use crate::error::{FlowError, SubmissionError};
use crate::network_switch::NetworkSwitchCoordinator;
use crate::notifications::{Notice, NoticeKind};
use crate::operation_log::OperationLog;
use crate::services::{
    AssetMetadataService, HeldAssets, NetworkContext, NotificationSink, TransactionService,
};
use crate::types::{DraftAsset, EditorMode, LifecycleState, ResolvedAsset, TransactionDraft, TransactionId};
use crate::utils;

/// Everything a send flow talks to.
#[derive(Clone)]
pub struct FlowServices {
    pub transactions: Arc<dyn TransactionService>,
    pub metadata: Arc<dyn AssetMetadataService>,
    pub network: Arc<dyn NetworkContext>,
    pub notifier: Arc<dyn NotificationSink>,
    pub held_assets: Arc<dyn HeldAssets>,
    /// Tokens the wallet already tracks
    pub known_tokens: Vec<ResolvedAsset>,
    /// Selected account
    pub sender: Option<Address>,
}

/// Result of a [`SendFlow::confirm`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Submitted(TransactionId),
    /// A submission was already in flight
    Ignored,
    /// Submission failed; the flow is back in EDIT
    Failed(SubmissionError),
    /// The flow was closed while the submission was in flight
    Abandoned(TransactionId),
}

struct FlowInner {
    state: LifecycleState,
    draft: TransactionDraft,
    cancelled: bool,
}

pub struct SendFlow {
    parser: DeepLinkParser,
    transactions: Arc<dyn TransactionService>,
    network: Arc<dyn NetworkContext>,
    notifier: Arc<dyn NotificationSink>,
    held_assets: Arc<dyn HeldAssets>,
    operation_log: Option<OperationLog>,
    config: Config,
    inner: Mutex<FlowInner>,
    state_tx: watch::Sender<LifecycleState>,
}

impl SendFlow {
    pub fn new(services: FlowServices, config: Config) -> Self {
        let resolver = AssetResolver::new(services.known_tokens, services.metadata);
        let coordinator = NetworkSwitchCoordinator::new(
            services.network.clone(),
            services.notifier.clone(),
            config.network_notice_ms,
        );
        let parser = DeepLinkParser::new(resolver, coordinator, services.transactions.clone())
            .with_sender(services.sender)
            .strict_chain_ids(config.strict_chain_ids);

        let mut draft = TransactionDraft::empty();
        draft.from = services.sender;
        let (state_tx, _) = watch::channel(LifecycleState::Loading);

        Self {
            parser,
            transactions: services.transactions,
            network: services.network,
            notifier: services.notifier,
            held_assets: services.held_assets,
            operation_log: None,
            config,
            inner: Mutex::new(FlowInner {
                state: LifecycleState::Loading,
                draft,
                cancelled: false,
            }),
            state_tx,
        }
    }

    pub fn with_operation_log(mut self, log: OperationLog) -> Self {
        self.operation_log = Some(log);
        self
    }

    pub async fn state(&self) -> LifecycleState {
        self.inner.lock().await.state
    }

    /// Snapshot of the live draft.
    pub async fn draft(&self) -> TransactionDraft {
        self.inner.lock().await.draft.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, inner: &mut FlowInner, state: LifecycleState) {
        if inner.state != state {
            debug!("Send flow {} -> {}", inner.state, state);
        }
        inner.state = state;
        self.state_tx.send_replace(state);
    }

    fn fresh_draft(&self) -> TransactionDraft {
        let mut draft = TransactionDraft::empty();
        draft.from = self.parser.sender();
        draft
    }

    /// Leave LOADING: build the draft from `request` if there is one,
    /// otherwise estimate gas for the empty draft.
    pub async fn open(&self, request: Option<DeepLinkRequest>) -> Result<LifecycleState, FlowError> {
        let state = self.state().await;
        if state != LifecycleState::Loading {
            return Err(FlowError::InvalidTransition { action: "open", state });
        }

        match request {
            Some(request) => self.handle_deep_link(request).await?,
            None => self.reset().await?,
        }
        Ok(self.state().await)
    }

    /// Run `body` against an opened flow and close it on every exit path.
    ///
    /// If this future is dropped or `body` panics, the cancel is left to
    /// `Drop`, which can only spawn it when a tokio runtime is running.
    pub async fn with_open<'a, F, Fut, T>(&'a self, request: Option<DeepLinkRequest>, body: F) -> Result<T, FlowError>
    where
        F: FnOnce(&'a SendFlow) -> Fut,
        Fut: Future<Output = Result<T, FlowError>> + 'a,
    {
        let result = match self.open(request).await {
            Ok(_) => body(self).await,
            Err(e) => Err(e),
        };
        self.close().await;
        result
    }

    /// Re-estimate gas for the live draft and return to EDIT.
    pub async fn reset(&self) -> Result<(), FlowError> {
        let draft = {
            let inner = self.inner.lock().await;
            match inner.state {
                LifecycleState::Loading | LifecycleState::Edit | LifecycleState::Review => inner.draft.clone(),
                state => return Err(FlowError::InvalidTransition { action: "reset", state }),
            }
        };

        let estimate = match self.transactions.estimate(&draft).await {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!("Gas estimation failed: {}", e);
                let mut inner = self.inner.lock().await;
                if inner.state == LifecycleState::Review {
                    self.set_state(&mut inner, LifecycleState::Edit);
                }
                drop(inner);
                self.notifier
                    .notify(Notice::new(NoticeKind::Error, "Gas estimation failed", e.to_string()));
                return Err(e.into());
            }
        };

        let mut inner = self.inner.lock().await;
        match inner.state {
            LifecycleState::Loading | LifecycleState::Edit | LifecycleState::Review => {
                inner.draft.apply_estimate(estimate);
                self.set_state(&mut inner, LifecycleState::Edit);
                Ok(())
            }
            state => Err(FlowError::InvalidTransition { action: "reset", state }),
        }
    }

    /// Replace the draft with one built from an inbound deep link.
    ///
    /// On failure the current draft is left untouched and the user is told
    /// why the link was dropped.
    pub async fn handle_deep_link(&self, request: DeepLinkRequest) -> Result<(), FlowError> {
        let state = self.state().await;
        if !matches!(
            state,
            LifecycleState::Loading | LifecycleState::Edit | LifecycleState::Review
        ) {
            return Err(FlowError::InvalidTransition {
                action: "handle deep link",
                state,
            });
        }

        let draft = match self.parser.parse(request).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Dropping deep link: {}", e);
                self.notifier.notify(
                    Notice::new(NoticeKind::Error, "Deep link failed", e.to_string())
                        .autodismiss(self.config.failure_notice_ms),
                );
                return Err(e.into());
            }
        };

        let mut inner = self.inner.lock().await;
        match inner.state {
            LifecycleState::Loading | LifecycleState::Edit | LifecycleState::Review => {
                info!(
                    "Deep link draft ready: {} to {}",
                    draft.readable_amount,
                    draft.recipient_checksum().unwrap_or_default()
                );
                inner.draft = draft;
                self.set_state(&mut inner, LifecycleState::Edit);
                Ok(())
            }
            state => Err(FlowError::InvalidTransition {
                action: "handle deep link",
                state,
            }),
        }
    }

    /// The single entry point for editor changes. Only valid in EDIT.
    pub async fn update_draft<F>(&self, edit: F) -> Result<(), FlowError>
    where
        F: FnOnce(&mut TransactionDraft),
    {
        let mut inner = self.inner.lock().await;
        if inner.state != LifecycleState::Edit {
            return Err(FlowError::InvalidTransition {
                action: "edit draft",
                state: inner.state,
            });
        }

        let mut draft = inner.draft.clone();
        edit(&mut draft);
        // The service assigns ids; readable amount always follows the amount
        draft.id = inner.draft.id.clone();
        let amount = draft.amount;
        draft.set_amount(amount);
        inner.draft = draft;
        Ok(())
    }

    /// Switch between EDIT and REVIEW.
    pub async fn change_mode(&self, mode: EditorMode) -> Result<(), FlowError> {
        let mut inner = self.inner.lock().await;
        match (inner.state, mode) {
            (LifecycleState::Edit, EditorMode::Edit) | (LifecycleState::Review, EditorMode::Review) => Ok(()),
            (LifecycleState::Edit, EditorMode::Review) => {
                if !inner.draft.has_gas() {
                    return Err(FlowError::DraftNotReady("gas limit and gas price are required"));
                }
                if inner.draft.recipient.is_none() {
                    return Err(FlowError::DraftNotReady("recipient is required"));
                }
                self.set_state(&mut inner, LifecycleState::Review);
                Ok(())
            }
            (LifecycleState::Review, EditorMode::Edit) => {
                self.set_state(&mut inner, LifecycleState::Edit);
                Ok(())
            }
            (state, _) => Err(FlowError::InvalidTransition {
                action: "change mode",
                state,
            }),
        }
    }

    /// Submit the reviewed draft.
    ///
    /// A second call while a submission is in flight is ignored. A failed
    /// submission always lands back in EDIT with freshly estimated gas.
    pub async fn confirm(&self) -> Result<ConfirmOutcome, FlowError> {
        let draft = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                LifecycleState::Confirming => {
                    debug!("Confirm ignored: submission already in flight");
                    return Ok(ConfirmOutcome::Ignored);
                }
                LifecycleState::Review => {}
                state => return Err(FlowError::InvalidTransition { action: "confirm", state }),
            }
            self.set_state(&mut inner, LifecycleState::Confirming);
            inner.draft.clone()
        };

        let result = self.transactions.submit(&draft).await;

        let mut inner = self.inner.lock().await;
        if inner.state != LifecycleState::Confirming {
            drop(inner);
            return Ok(match result {
                Ok(id) => {
                    warn!("Send flow closed while transaction {} was being submitted", id);
                    // Broadcast already happened: side effects still apply, state stays CANCELLED
                    self.after_submission(&draft, &id).await;
                    ConfirmOutcome::Abandoned(id)
                }
                Err(e) => ConfirmOutcome::Failed(e),
            });
        }

        match result {
            Ok(id) => {
                let mut submitted = std::mem::replace(&mut inner.draft, self.fresh_draft());
                submitted.id = Some(id.clone());
                self.set_state(&mut inner, LifecycleState::Submitted);
                drop(inner);

                self.after_submission(&submitted, &id).await;
                Ok(ConfirmOutcome::Submitted(id))
            }
            Err(e) => {
                self.set_state(&mut inner, LifecycleState::Edit);
                drop(inner);

                error!("Transaction submission failed: {}", e);
                self.notifier
                    .notify(Notice::new(NoticeKind::Error, "Transaction error", e.to_string()).blocking());
                if let Err(reset_err) = self.reset().await {
                    warn!("Could not re-estimate gas after failed submission: {}", reset_err);
                }
                Ok(ConfirmOutcome::Failed(e))
            }
        }
    }

    async fn after_submission(&self, draft: &TransactionDraft, id: &TransactionId) {
        if let DraftAsset::NonFungible(collectible) = &draft.asset {
            if let Err(e) = self
                .held_assets
                .remove_collectible(collectible.address, collectible.token_id)
                .await
            {
                warn!("Failed to remove sent collectible from held assets: {}", e);
            }
        }

        let recipient = draft.recipient_checksum().unwrap_or_default();
        let symbol = draft.symbol(self.config.native_token());
        info!("Transaction {} submitted: {} {} to {}", id, draft.readable_amount, symbol, recipient);
        self.notifier.notify(Notice::new(
            NoticeKind::Success,
            "Transaction submitted",
            format!("{} {} to {}", draft.readable_amount, symbol, recipient),
        ));

        let gas_price = draft.gas_price.map(utils::format_gwei).unwrap_or_default();
        self.log_operation(
            "submit",
            &format!(
                "id={}\nto={}\namount={} {}\ngas_limit={}\ngas_price={} gwei",
                id,
                recipient,
                draft.readable_amount,
                symbol,
                draft.gas_limit.unwrap_or_default(),
                gas_price
            ),
        );
    }

    fn log_operation(&self, operation: &str, details: &str) {
        if let Some(log) = &self.operation_log {
            if let Err(e) = log.append(operation, self.network.active_chain_id(), details) {
                warn!("Failed to write operation log: {}", e);
            }
        }
    }

    /// Explicit user cancel.
    pub async fn cancel(&self) -> Result<(), FlowError> {
        self.cancel_once().await
    }

    /// Tear the flow down. Safe to call any number of times, before or after
    /// [`SendFlow::cancel`]; the service sees at most one cancel.
    pub async fn close(&self) {
        if let Err(e) = self.cancel_once().await {
            error!("Failed to cancel transaction on close: {}", e);
        }
    }

    async fn cancel_once(&self) -> Result<(), FlowError> {
        let (previous, id) = {
            let mut inner = self.inner.lock().await;
            if inner.cancelled || inner.state.is_terminal() {
                return Ok(());
            }
            inner.cancelled = true;
            let previous = inner.state;
            let discarded = std::mem::replace(&mut inner.draft, self.fresh_draft());
            self.set_state(&mut inner, LifecycleState::Cancelled);
            (previous, discarded.id)
        };

        if previous == LifecycleState::Loading {
            debug!("Send flow closed before a draft existed");
            return Ok(());
        }

        info!("Cancelling transaction from {}", previous);
        self.transactions
            .cancel(id.as_ref())
            .await
            .map_err(|e| FlowError::Service(e.to_string()))?;
        self.log_operation(
            "cancel",
            &format!("from_state={}\nid={}", previous, id.map(|i| i.0).unwrap_or_else(|| "-".into())),
        );
        Ok(())
    }
}

impl Drop for SendFlow {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if inner.cancelled || inner.state.is_terminal() || inner.state == LifecycleState::Loading {
            return;
        }
        warn!("Send flow dropped in {} without close()", inner.state);
        inner.cancelled = true;

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime available, transaction left uncancelled");
            return;
        };
        let transactions = self.transactions.clone();
        let id = inner.draft.id.take();
        handle.spawn(async move {
            if let Err(e) = transactions.cancel(id.as_ref()).await {
                error!("Failed to cancel transaction of dropped send flow: {}", e);
            }
        });
    }
}
