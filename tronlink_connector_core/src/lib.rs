// TronLink Connector Core Library
// Platform-agnostic wallet detection and connection lifecycle

pub mod error;
pub mod models;
pub mod settings;
pub mod provider;
pub mod host;
pub mod actions;
pub mod detector;
pub mod messages;
pub mod signer;
pub mod store;
pub mod connector;

#[cfg(feature = "native")]
pub mod native;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use error::{ConnectorError, ProviderRpcError};
pub use models::*;
pub use settings::{ConnectorSettings, DetectOptions};
pub use provider::{classify_provider, select_provider, Provider, ProviderEvent, ProviderKind};
pub use host::ProviderHost;
pub use actions::{ActivationToken, Actions};
pub use detector::detect_provider;
pub use messages::TronLinkMessage;
pub use signer::{SigningBackend, TransactionRequest, TransferSigner, TronWebSigner, WalletSigner};
pub use store::{ConnectorState, StateStore};
pub use connector::{InitStatus, TronLinkConnector};
