use std::sync::Arc;

use ethers::types::{Address, U256};
use tracing::{debug, info};

use super::{DeepLinkRequest, RawDeepLinkPayload, TransferRequest};
use crate::asset_resolver::AssetResolver;
use crate::error::DeepLinkError;
use crate::network_switch::{NetworkSwitchCoordinator, SwitchOutcome};
use crate::services::TransactionService;
use crate::types::{DraftAsset, TransactionDraft};

/// Turns an untrusted deep link request into a complete draft.
///
/// Either a fully populated draft comes back (recipient, amount, gas limit
/// and gas price all set) or an error; no partial draft ever escapes.
pub struct DeepLinkParser {
    resolver: AssetResolver,
    network: NetworkSwitchCoordinator,
    transactions: Arc<dyn TransactionService>,
    sender: Option<Address>,
    strict_chain_ids: bool,
}

impl DeepLinkParser {
    pub fn new(
        resolver: AssetResolver,
        network: NetworkSwitchCoordinator,
        transactions: Arc<dyn TransactionService>,
    ) -> Self {
        Self {
            resolver,
            network,
            transactions,
            sender: None,
            strict_chain_ids: false,
        }
    }

    /// Account the drafts are sent from.
    pub fn with_sender(mut self, sender: Option<Address>) -> Self {
        self.sender = sender;
        self
    }

    /// Reject unknown chain ids instead of ignoring them.
    pub fn strict_chain_ids(mut self, strict: bool) -> Self {
        self.strict_chain_ids = strict;
        self
    }

    pub fn sender(&self) -> Option<Address> {
        self.sender
    }

    pub async fn parse_payload(&self, payload: RawDeepLinkPayload) -> Result<TransactionDraft, DeepLinkError> {
        self.parse(DeepLinkRequest::try_from(payload)?).await
    }

    pub async fn parse(&self, request: DeepLinkRequest) -> Result<TransactionDraft, DeepLinkError> {
        // Switch first so token metadata and estimation hit the requested chain
        if let Some(chain_id) = request.chain_id {
            if self.network.switch_if_needed(chain_id) == SwitchOutcome::UnknownChain && self.strict_chain_ids {
                return Err(DeepLinkError::UnknownChain(chain_id));
            }
        }

        let mut draft = TransactionDraft::empty();
        draft.from = self.sender;

        match request.transfer {
            TransferRequest::Native(native) => {
                draft.recipient = Some(native.recipient);
                draft.set_amount(native.value.unwrap_or_else(U256::zero));
            }
            TransferRequest::Token(token) => {
                let asset = self.resolver.resolve(token.token).await?;
                info!("Deep link token transfer of {} ({} decimals)", asset.symbol, asset.decimals);
                draft.asset = DraftAsset::Fungible(asset);
                draft.recipient = Some(token.recipient);
                draft.set_amount(token.amount.unwrap_or_else(U256::zero));
            }
        }

        draft.gas_limit = request.gas.gas;
        draft.gas_price = request.gas.gas_price;

        if !draft.has_gas() {
            let estimate = self.transactions.estimate(&draft).await?;
            debug!(
                "Estimated gas limit {} at price {} for deep link draft",
                estimate.gas_limit, estimate.gas_price
            );
            draft.fill_missing_gas(estimate);
        }

        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NoticeLog;
    use crate::testing::{MockMetadata, MockNetwork, MockTransactionService};
    use crate::types::{AssetType, GasEstimate};
    use crate::utils;
    use serde_json::json;

    const RECIPIENT: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const TOKEN: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";

    struct Harness {
        parser: DeepLinkParser,
        service: Arc<MockTransactionService>,
        network: Arc<MockNetwork>,
        metadata: Arc<MockMetadata>,
    }

    fn harness(decimals: Option<u32>, symbol: Option<&str>) -> Harness {
        let service = Arc::new(MockTransactionService::default());
        let network = Arc::new(MockNetwork::new(1));
        let metadata = Arc::new(MockMetadata::new(decimals, symbol));
        let notices = Arc::new(NoticeLog::default());
        let parser = DeepLinkParser::new(
            AssetResolver::new(vec![], metadata.clone()),
            NetworkSwitchCoordinator::new(network.clone(), notices, 5000),
            service.clone(),
        );
        Harness {
            parser,
            service,
            network,
            metadata,
        }
    }

    fn payload(value: serde_json::Value) -> RawDeepLinkPayload {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_native_one_ether_reads_as_one() {
        let h = harness(Some(18), Some("TKN"));
        let draft = h
            .parser
            .parse_payload(payload(json!({
                "target_address": RECIPIENT,
                "action": "send-native",
                "parameters": { "value": "1000000000000000000" }
            })))
            .await
            .unwrap();

        assert_eq!(draft.asset_type(), AssetType::Native);
        assert_eq!(draft.readable_amount, "1");
        assert_eq!(draft.recipient_checksum().as_deref(), Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert_eq!(draft.gas_limit, Some(MockTransactionService::DEFAULT_ESTIMATE.gas_limit));
        assert_eq!(draft.gas_price, Some(MockTransactionService::DEFAULT_ESTIMATE.gas_price));
    }

    #[tokio::test]
    async fn test_token_transfer_scenario() {
        let h = harness(Some(2), Some("TKN"));
        let draft = h
            .parser
            .parse_payload(payload(json!({
                "target_address": TOKEN,
                "action": "send-token",
                "parameters": { "address": RECIPIENT, "tokenAmount": "500" }
            })))
            .await
            .unwrap();

        assert_eq!(draft.amount, U256::from(500u64));
        assert_eq!(draft.readable_amount, "5.00");
        assert_eq!(
            draft.recipient_checksum(),
            Some(utils::checksum(&utils::parse_address(RECIPIENT).unwrap()))
        );
        let asset = draft.selected_asset().unwrap();
        assert_eq!(asset.symbol, "TKN");
        assert_eq!(asset.address, utils::parse_address(TOKEN).unwrap());
    }

    #[tokio::test]
    async fn test_missing_amount_defaults_to_zero() {
        let h = harness(Some(18), Some("TKN"));
        let draft = h
            .parser
            .parse(DeepLinkRequest::native(utils::parse_address(RECIPIENT).unwrap(), None))
            .await
            .unwrap();
        assert_eq!(draft.amount, U256::zero());
        assert_eq!(draft.readable_amount, "0");
    }

    #[tokio::test]
    async fn test_unsupported_action_builds_nothing() {
        let h = harness(Some(18), Some("TKN"));
        let err = h
            .parser
            .parse_payload(payload(json!({ "target_address": RECIPIENT, "action": "swap" })))
            .await
            .unwrap_err();
        assert_eq!(err, DeepLinkError::UnsupportedAction("swap".to_string()));
        assert_eq!(h.service.estimate_calls(), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_decimals_fail_the_parse() {
        let h = harness(None, Some("TKN"));
        let request = DeepLinkRequest::token(
            utils::parse_address(TOKEN).unwrap(),
            utils::parse_address(RECIPIENT).unwrap(),
            Some(U256::from(1u64)),
        );
        let err = h.parser.parse(request).await.unwrap_err();
        assert!(matches!(err, DeepLinkError::AssetResolution(_)));
        assert_eq!(h.service.estimate_calls(), 0);
    }

    #[tokio::test]
    async fn test_full_gas_overrides_skip_estimation() {
        let h = harness(Some(18), Some("TKN"));
        let request = DeepLinkRequest::native(utils::parse_address(RECIPIENT).unwrap(), None)
            .with_gas(Some(U256::from(30_000u64)), Some(U256::from(5u64)));
        let draft = h.parser.parse(request).await.unwrap();
        assert_eq!(draft.gas_limit, Some(U256::from(30_000u64)));
        assert_eq!(draft.gas_price, Some(U256::from(5u64)));
        assert_eq!(h.service.estimate_calls(), 0);
    }

    #[tokio::test]
    async fn test_partial_override_is_kept_and_rest_estimated() {
        let h = harness(Some(18), Some("TKN"));
        h.service.set_estimate(Ok(GasEstimate {
            gas_limit: U256::from(21_000u64),
            gas_price: U256::from(9u64),
        }));
        let request = DeepLinkRequest::native(utils::parse_address(RECIPIENT).unwrap(), None)
            .with_gas(Some(U256::from(60_000u64)), None);
        let draft = h.parser.parse(request).await.unwrap();
        assert_eq!(draft.gas_limit, Some(U256::from(60_000u64)));
        assert_eq!(draft.gas_price, Some(U256::from(9u64)));
        assert_eq!(h.service.estimate_calls(), 1);
    }

    #[tokio::test]
    async fn test_estimation_failure_is_fatal() {
        let h = harness(Some(18), Some("TKN"));
        h.service.set_estimate(Err("node unavailable".to_string()));
        let err = h
            .parser
            .parse(DeepLinkRequest::native(utils::parse_address(RECIPIENT).unwrap(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, DeepLinkError::Estimation(_)));
    }

    #[tokio::test]
    async fn test_chain_switch_happens_before_resolution() {
        let h = harness(Some(6), Some("TKN"));
        let request = DeepLinkRequest::token(
            utils::parse_address(TOKEN).unwrap(),
            utils::parse_address(RECIPIENT).unwrap(),
            None,
        )
        .on_chain(137);
        h.parser.parse(request).await.unwrap();
        assert_eq!(h.network.switches(), vec!["polygon".to_string()]);
        assert_eq!(h.metadata.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_chain_ignored_unless_strict() {
        let h = harness(Some(18), Some("TKN"));
        let request = DeepLinkRequest::native(utils::parse_address(RECIPIENT).unwrap(), None).on_chain(31337);
        assert!(h.parser.parse(request.clone()).await.is_ok());

        let strict = h.parser.strict_chain_ids(true);
        let err = strict.parse(request).await.unwrap_err();
        assert_eq!(err, DeepLinkError::UnknownChain(31337));
    }
}
