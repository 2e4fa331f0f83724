// Signing surface over the wallet-owned signing object (`window.tronWeb`)
// Both signer variants forward to the wallet; nothing is signed locally

use crate::error::ConnectorError;
use crate::provider::ProviderResult;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::rc::Rc;

pub type SignerResult<T> = Result<T, ConnectorError>;

/// Methods of the signing object the wallet injects into the page
#[async_trait(?Send)]
pub trait SigningBackend {
    /// Base58 address of the selected account, `None` while locked
    fn default_address(&self) -> Option<String>;

    /// `trx.sign`: signs a transaction object or a hex-encoded message
    async fn sign(&self, payload: Value) -> ProviderResult<Value>;

    /// `trx.sendTransaction`: wallet-side build, sign and broadcast of a `{to, value}` object
    async fn send_transaction(&self, transaction: Value) -> ProviderResult<Value>;

    /// `transactionBuilder.sendTrx`: unsigned transfer transaction
    async fn build_transfer(&self, to: &str, amount: u64, from: &str) -> ProviderResult<Value>;

    /// `trx.sendRawTransaction`
    async fn broadcast(&self, signed: Value) -> ProviderResult<Value>;
}

/// Value transfer in sun (1 TRX = 1_000_000 sun)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub to: String,
    pub value: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl TransactionRequest {
    pub fn transfer(to: impl Into<String>, value: u64) -> Self {
        Self {
            to: to.into(),
            value,
            from: None,
        }
    }
}

/// Uniform signing surface shared by both signer variants
#[async_trait(?Send)]
pub trait WalletSigner {
    async fn get_address(&self) -> SignerResult<String>;

    async fn sign_message(&self, message: &str) -> SignerResult<Value>;

    async fn sign_transaction(&self, transaction: Value) -> SignerResult<Value>;

    async fn send_transaction(&self, request: TransactionRequest) -> SignerResult<Value>;

    async fn send_transaction_with_sign(&self, request: TransactionRequest) -> SignerResult<Value>;
}

/// `0x`-prefixed hex of the UTF-8 bytes, the form `trx.sign` expects for messages
pub fn encode_message(message: &str) -> String {
    format!("0x{}", hex::encode(message.as_bytes()))
}

fn bound(backend: &Option<Rc<dyn SigningBackend>>) -> SignerResult<&Rc<dyn SigningBackend>> {
    backend.as_ref().ok_or(ConnectorError::NoProvider)
}

fn sender(backend: &dyn SigningBackend, request: &TransactionRequest) -> SignerResult<String> {
    request
        .from
        .clone()
        .or_else(|| backend.default_address())
        .ok_or(ConnectorError::Locked)
}

async fn build_sign_broadcast(
    backend: &dyn SigningBackend,
    request: &TransactionRequest,
) -> SignerResult<Value> {
    let from = sender(backend, request)?;
    debug!("Building transfer of {} sun from {} to {}", request.value, from, request.to);
    let unsigned = backend.build_transfer(&request.to, request.value, &from).await?;
    let signed = backend.sign(unsigned).await?;
    Ok(backend.broadcast(signed).await?)
}

async fn sign_hex_message(backend: &dyn SigningBackend, message: &str) -> SignerResult<Value> {
    Ok(backend.sign(Value::String(encode_message(message))).await?)
}

fn address_of(backend: &dyn SigningBackend) -> SignerResult<String> {
    backend.default_address().ok_or(ConnectorError::Locked)
}

/// Ethereum-style signer: `send_transaction` hands a `{to, value}` object to the wallet
pub struct TronWebSigner {
    backend: Option<Rc<dyn SigningBackend>>,
}

impl TronWebSigner {
    pub fn new(backend: Option<Rc<dyn SigningBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait(?Send)]
impl WalletSigner for TronWebSigner {
    async fn get_address(&self) -> SignerResult<String> {
        address_of(&**bound(&self.backend)?)
    }

    async fn sign_message(&self, message: &str) -> SignerResult<Value> {
        sign_hex_message(&**bound(&self.backend)?, message).await
    }

    async fn sign_transaction(&self, transaction: Value) -> SignerResult<Value> {
        Ok(bound(&self.backend)?.sign(transaction).await?)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> SignerResult<Value> {
        let backend = bound(&self.backend)?;
        let transaction = json!({ "to": request.to, "value": request.value });
        Ok(backend.send_transaction(transaction).await?)
    }

    async fn send_transaction_with_sign(&self, request: TransactionRequest) -> SignerResult<Value> {
        build_sign_broadcast(&**bound(&self.backend)?, &request).await
    }
}

/// Chain-native signer: every send is an explicit build, sign, broadcast of a TRX transfer
pub struct TransferSigner {
    backend: Option<Rc<dyn SigningBackend>>,
}

impl TransferSigner {
    pub fn new(backend: Option<Rc<dyn SigningBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait(?Send)]
impl WalletSigner for TransferSigner {
    async fn get_address(&self) -> SignerResult<String> {
        address_of(&**bound(&self.backend)?)
    }

    async fn sign_message(&self, message: &str) -> SignerResult<Value> {
        sign_hex_message(&**bound(&self.backend)?, message).await
    }

    async fn sign_transaction(&self, transaction: Value) -> SignerResult<Value> {
        Ok(bound(&self.backend)?.sign(transaction).await?)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> SignerResult<Value> {
        let backend = bound(&self.backend)?;
        let request = TransactionRequest {
            from: None,
            ..request
        };
        build_sign_broadcast(&**backend, &request).await
    }

    async fn send_transaction_with_sign(&self, request: TransactionRequest) -> SignerResult<Value> {
        build_sign_broadcast(&**bound(&self.backend)?, &request).await
    }
}
