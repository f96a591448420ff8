use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{self, EvmNetwork};
use crate::notifications::{Notice, NoticeKind};
use crate::services::{NetworkContext, NotificationSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Requested network is already active
    Unchanged,
    Switched(&'static EvmNetwork),
    /// Chain id does not map to a known network; nothing was changed
    UnknownChain,
}

/// Moves the wallet onto the network a deep link asks for.
pub struct NetworkSwitchCoordinator {
    network: Arc<dyn NetworkContext>,
    notifier: Arc<dyn NotificationSink>,
    notice_ms: u64,
}

impl NetworkSwitchCoordinator {
    pub fn new(network: Arc<dyn NetworkContext>, notifier: Arc<dyn NotificationSink>, notice_ms: u64) -> Self {
        Self {
            network,
            notifier,
            notice_ms,
        }
    }

    pub fn active_chain_id(&self) -> u64 {
        self.network.active_chain_id()
    }

    pub fn switch_if_needed(&self, target_chain_id: u64) -> SwitchOutcome {
        let Some(target) = config::find_network_by_chain_id(target_chain_id) else {
            warn!("Deep link requested unknown chain id {}", target_chain_id);
            return SwitchOutcome::UnknownChain;
        };

        if self.network.active_chain_id() == target.chain_id {
            return SwitchOutcome::Unchanged;
        }

        info!("Switching network to {} (chain id {})", target.label, target.chain_id);
        self.network.switch_to(target.network_id);
        self.notifier.notify(
            Notice::new(
                NoticeKind::Warning,
                "Network changed",
                format!("Switched to {}", target.label),
            )
            .autodismiss(self.notice_ms),
        );
        SwitchOutcome::Switched(target)
    }
}
