// Injected wallet provider abstraction
// Browser builds wrap `window.tron`, tests script the replies

use crate::error::ProviderRpcError;
use crate::models::RequestArguments;
use async_trait::async_trait;
use serde_json::Value;
use std::rc::Rc;

/// Result type for provider requests
pub type ProviderResult<T> = Result<T, ProviderRpcError>;

/// RPC method names understood by the injected provider
pub mod methods {
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
    pub const WATCH_ASSET: &str = "wallet_watchAsset";
}

/// Notification emitted by the provider after it has been injected.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    Connect { chain_id: String },
    Disconnect(ProviderRpcError),
    ChainChanged(String),
    AccountsChanged(Vec<String>),
}

impl ProviderEvent {
    /// Event name as emitted by the wallet
    pub fn name(&self) -> &'static str {
        match self {
            ProviderEvent::Connect { .. } => "connect",
            ProviderEvent::Disconnect(_) => "disconnect",
            ProviderEvent::ChainChanged(_) => "chainChanged",
            ProviderEvent::AccountsChanged(_) => "accountsChanged",
        }
    }
}

pub type EventListener = Rc<dyn Fn(ProviderEvent)>;

/// Wallet object injected into the page by the extension
#[async_trait(?Send)]
pub trait Provider {
    /// Issue one RPC-style request
    async fn request(&self, args: RequestArguments) -> ProviderResult<Value>;

    /// Subscribe to connect, disconnect, chainChanged and accountsChanged
    fn on(&self, listener: EventListener);

    /// Whether the wallet already considers this site connected
    fn is_connected(&self) -> bool {
        false
    }

    /// Whether this object identifies itself as TronLink
    fn is_tronlink(&self) -> bool {
        false
    }

    /// Sibling providers when several wallets share the injection slot
    fn sibling_providers(&self) -> Vec<Rc<dyn Provider>> {
        Vec::new()
    }
}

/// What an injected object turned out to be.
pub enum ProviderKind {
    Canonical(Rc<dyn Provider>),
    Foreign(Rc<dyn Provider>),
    Container(Vec<Rc<dyn Provider>>),
}

pub fn classify_provider(provider: Rc<dyn Provider>) -> ProviderKind {
    let siblings = provider.sibling_providers();
    if !siblings.is_empty() {
        return ProviderKind::Container(siblings);
    }
    if provider.is_tronlink() {
        ProviderKind::Canonical(provider)
    } else {
        ProviderKind::Foreign(provider)
    }
}

/// Pick the provider the connector should drive: the TronLink entry of a
/// container, else its first entry, else the object itself.
pub fn select_provider(provider: Rc<dyn Provider>) -> Option<Rc<dyn Provider>> {
    match classify_provider(provider) {
        ProviderKind::Canonical(p) | ProviderKind::Foreign(p) => Some(p),
        ProviderKind::Container(siblings) => {
            let canonical = siblings.iter().find(|p| p.is_tronlink()).cloned();
            canonical.or_else(|| siblings.into_iter().next())
        }
    }
}
