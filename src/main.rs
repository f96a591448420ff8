use std::sync::Arc;

use anyhow::{anyhow, Result};
use sendflow::config::{self, Config};
use sendflow::deeplink::DeepLinkRequest;
use sendflow::notifications::NoticeLog;
use sendflow::operation_log::OperationLog;
use sendflow::rpc::RpcSession;
use sendflow::send_flow::{FlowServices, SendFlow};
use sendflow::services::NetworkContext;
use sendflow::user_settings::UserSettings;
use sendflow::utils;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let link = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: sendflow <ethereum:... deep link>"))?;
    let request = DeepLinkRequest::from_uri(&link)?;

    let settings = UserSettings::load();
    let config = Config::from_env(
        settings.selected_chain_id,
        settings.get_custom_rpc(settings.selected_chain_id).map(String::as_str),
    );
    tracing::info!("Active network: {} ({})", config.network_label(), config.chain_id);

    let session = Arc::new(RpcSession::new(&config, settings.custom_rpcs.clone()));
    let notices = Arc::new(NoticeLog::default());
    let services = FlowServices {
        transactions: session.clone(),
        metadata: session.clone(),
        network: session.clone(),
        notifier: notices.clone(),
        held_assets: session.clone(),
        known_tokens: settings.tracked_tokens(config.chain_id),
        sender: settings.selected_account,
    };
    let flow = SendFlow::new(services, config).with_operation_log(OperationLog::default_location());

    let draft = flow
        .with_open(Some(request), |flow| async move { Ok(flow.draft().await) })
        .await?;

    let chain_id = session.active_chain_id();
    let native = config::find_network_by_chain_id(chain_id)
        .map(|n| n.native_token)
        .unwrap_or("ETH");
    let recipient = draft.recipient_checksum().unwrap_or_default();

    println!("Network:   {}", chain_id);
    println!("Send:      {} {}", draft.readable_amount, draft.symbol(native));
    println!("To:        {}", recipient);
    if let Some(url) = config::get_address_explorer_url(chain_id, &recipient) {
        println!("           {}", url);
    }
    println!("Gas limit: {}", draft.gas_limit.unwrap_or_default());
    println!("Gas price: {} gwei", draft.gas_price.map(utils::format_gwei).unwrap_or_default());
    if let Ok(tx) = draft.to_request() {
        if let Some(data) = tx.data {
            println!("Calldata:  0x{}", hex::encode(&data));
        }
    }
    for entry in notices.entries() {
        println!("[{}] {}", entry.time_ago(), entry.message());
    }

    Ok(())
}
