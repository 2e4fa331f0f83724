use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error code a wallet returns when asked to switch to a chain it does not know.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Error code a wallet returns when the user dismisses a prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Error object reported by the injected provider for a failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Some wallets wrap the real failure in `data.originalError`; that code wins.
    pub fn effective_code(&self) -> i64 {
        self.data
            .as_ref()
            .and_then(|d| d.get("originalError"))
            .and_then(|e| e.get("code"))
            .and_then(Value::as_i64)
            .unwrap_or(self.code)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.effective_code() == UNRECOGNIZED_CHAIN_CODE
    }
}

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("TronLink is not installed")]
    NotInstalled,

    #[error("No provider")]
    NoProvider,

    #[error("Wallet is locked")]
    Locked,

    #[error("Wallet stayed on chain {actual} after switching to {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("User rejected the request ({code}): {message}")]
    UserRejected { code: i64, message: String },

    #[error(transparent)]
    Rpc(#[from] ProviderRpcError),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "native")]
    #[error("Configuration error: {0}")]
    Config(String),

    #[cfg(feature = "native")]
    #[error("I/O error: {0}")]
    Io(String),

    #[error("TOML serialization error: {0}")]
    TomlSerialization(String),
}

impl ConnectorError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ConnectorError::UserRejected {
            code: USER_REJECTED_CODE,
            message: message.into(),
        }
    }

    /// Provider error as returned by the wallet, if this is one.
    pub fn rpc(&self) -> Option<&ProviderRpcError> {
        match self {
            ConnectorError::Rpc(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(feature = "native")]
impl From<std::io::Error> for ConnectorError {
    fn from(err: std::io::Error) -> Self {
        ConnectorError::Io(err.to_string())
    }
}

#[cfg(feature = "native")]
impl From<config::ConfigError> for ConnectorError {
    fn from(err: config::ConfigError) -> Self {
        ConnectorError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ConnectorError {
    fn from(err: toml::ser::Error) -> Self {
        ConnectorError::TomlSerialization(err.to_string())
    }
}
