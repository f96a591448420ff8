//! Importing tokens the wallet detected on its own.
//!
//! The user unchecks tokens they do not want; everything unchecked is
//! ignored, everything else is imported, and one toast summarises the result.

use std::collections::HashSet;

use ethers::types::Address;
use tracing::error;

use crate::notifications::{Notice, NoticeKind};
use crate::services::{NotificationSink, TokensService};
use crate::types::ResolvedAsset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    pub to_import: Vec<ResolvedAsset>,
    pub to_ignore: Vec<ResolvedAsset>,
}

impl ImportPlan {
    pub fn new(detected: &[ResolvedAsset], ignored: &HashSet<Address>, ignore_all: bool) -> Self {
        let (to_ignore, to_import) = detected
            .iter()
            .cloned()
            .partition(|token| ignore_all || ignored.contains(&token.address));
        Self { to_import, to_ignore }
    }

    /// Whether the user needs to confirm before the plan runs: anything
    /// being hidden asks first, a plain "import everything" does not.
    pub fn needs_confirmation(&self) -> bool {
        !self.to_ignore.is_empty()
    }

    /// Toast shown once the plan has been applied.
    pub fn notice(&self) -> Option<Notice> {
        if !self.to_import.is_empty() {
            let symbols = self
                .to_import
                .iter()
                .map(|t| t.symbol.to_uppercase())
                .collect::<Vec<_>>()
                .join(", ");
            Some(Notice::new(
                NoticeKind::Success,
                "Tokens imported",
                format!("Successfully imported {}", symbols),
            ))
        } else if !self.to_ignore.is_empty() {
            Some(Notice::new(
                NoticeKind::Info,
                "Tokens hidden",
                "You can add them back from the token list at any time",
            ))
        } else {
            None
        }
    }

    fn failure_context(&self) -> &'static str {
        if self.to_import.is_empty() {
            "Failed to hide all detected tokens"
        } else {
            "Failed to import detected tokens"
        }
    }
}

/// Apply `plan`: ignore first, then import, then show the toast.
pub async fn import_detected(
    plan: &ImportPlan,
    tokens: &dyn TokensService,
    notifier: &dyn NotificationSink,
) -> anyhow::Result<()> {
    let result = async {
        if !plan.to_ignore.is_empty() {
            tokens.ignore_tokens(&plan.to_ignore).await?;
        }
        if !plan.to_import.is_empty() {
            tokens.import_tokens(&plan.to_import).await?;
        }
        anyhow::Ok(())
    }
    .await;

    match result {
        Ok(()) => {
            if let Some(notice) = plan.notice() {
                notifier.notify(notice.autodismiss(5000));
            }
            Ok(())
        }
        Err(e) => {
            error!("{}: {}", plan.failure_context(), e);
            Err(e.context(plan.failure_context()))
        }
    }
}
