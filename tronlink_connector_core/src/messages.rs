// TronLink page messages
//
// Besides the provider events, TronLink posts `{ message: { action, data } }`
// envelopes to the page. They are decoded into a closed set of actions here;
// anything else is ignored.

use crate::actions::Actions;
use crate::models::StateUpdate;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

pub const MAINNET_CHAIN_ID: u64 = 0x2b6653dc;
pub const SHASTA_CHAIN_ID: u64 = 0x94a9059e;
pub const NILE_CHAIN_ID: u64 = 0xcd8690dc;

static NODE_CHAINS: Lazy<HashMap<&'static str, u64>> = Lazy::new(|| {
    HashMap::from([
        ("api.trongrid.io", MAINNET_CHAIN_ID),
        ("api.tronstack.io", MAINNET_CHAIN_ID),
        ("api.shasta.trongrid.io", SHASTA_CHAIN_ID),
        ("nile.trongrid.io", NILE_CHAIN_ID),
        ("api.nileex.io", NILE_CHAIN_ID),
    ])
});

/// Node the wallet switched to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub full_node: String,
    #[serde(default)]
    pub solidity_node: Option<String>,
    #[serde(default)]
    pub event_server: Option<String>,
    #[serde(default)]
    pub chain: Option<String>,
}

impl NodeInfo {
    /// Chain id of a well-known public node, looked up by host
    pub fn chain_id(&self) -> Option<u64> {
        let url = Url::parse(&self.full_node).ok()?;
        NODE_CHAINS.get(url.host_str()?).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TronLinkMessage {
    AccountsChanged { address: Option<String> },
    SetNode(NodeInfo),
    Connect,
    Disconnect,
    DisconnectWeb,
    RejectWeb,
    Unknown(String),
}

impl TronLinkMessage {
    /// Decode the payload of a page `message` event; `None` for non-wallet traffic.
    pub fn decode(data: &Value) -> Option<Self> {
        let message = data.get("message")?;
        let action = message.get("action")?.as_str()?;
        let payload = message.get("data").cloned().unwrap_or(Value::Null);

        let decoded = match action {
            "accountsChanged" => TronLinkMessage::AccountsChanged {
                address: payload
                    .get("address")
                    .and_then(Value::as_str)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string),
            },
            "setNode" => match payload.get("node").cloned().map(serde_json::from_value) {
                Some(Ok(node)) => TronLinkMessage::SetNode(node),
                _ => {
                    warn!("Malformed setNode message: {}", payload);
                    return None;
                }
            },
            "connect" => TronLinkMessage::Connect,
            "disconnect" => TronLinkMessage::Disconnect,
            "disconnectWeb" => TronLinkMessage::DisconnectWeb,
            "rejectWeb" => TronLinkMessage::RejectWeb,
            other => TronLinkMessage::Unknown(other.to_string()),
        };
        Some(decoded)
    }

    pub fn action(&self) -> &str {
        match self {
            TronLinkMessage::AccountsChanged { .. } => "accountsChanged",
            TronLinkMessage::SetNode(_) => "setNode",
            TronLinkMessage::Connect => "connect",
            TronLinkMessage::Disconnect => "disconnect",
            TronLinkMessage::DisconnectWeb => "disconnectWeb",
            TronLinkMessage::RejectWeb => "rejectWeb",
            TronLinkMessage::Unknown(action) => action,
        }
    }
}

/// Apply one decoded message to the action layer
pub fn dispatch_message<A: Actions + ?Sized>(message: TronLinkMessage, actions: &A) {
    debug!("TronLink message: {}", message.action());
    match message {
        TronLinkMessage::AccountsChanged { address: Some(address) } => {
            if let Err(e) = actions.update(StateUpdate::accounts(vec![address])) {
                warn!("Ignoring accountsChanged message: {}", e);
            }
        }
        TronLinkMessage::AccountsChanged { address: None }
        | TronLinkMessage::Disconnect
        | TronLinkMessage::DisconnectWeb
        | TronLinkMessage::RejectWeb => actions.reset_state(),
        TronLinkMessage::SetNode(node) => match node.chain_id() {
            Some(chain_id) => {
                if let Err(e) = actions.update(StateUpdate::chain(chain_id)) {
                    warn!("Ignoring setNode message: {}", e);
                }
            }
            None => info!("Wallet switched to unrecognised node {}", node.full_node),
        },
        TronLinkMessage::Connect => info!("TronLink reports the site as connected"),
        TronLinkMessage::Unknown(_) => {}
    }
}

/// Decode and apply a raw page message
pub fn handle_raw_message<A: Actions + ?Sized>(data: &Value, actions: &A) {
    if let Some(message) = TronLinkMessage::decode(data) {
        dispatch_message(message, actions);
    }
}
