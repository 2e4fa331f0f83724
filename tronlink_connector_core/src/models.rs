use crate::error::ConnectorError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

/// Largest chain id representable as a JS number without precision loss.
pub const MAX_SAFE_CHAIN_ID: u64 = 9_007_199_254_740_991;

/// Arguments of a single provider request (`request({ method, params })`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestArguments {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            params: None,
        }
    }

    pub fn with_params(method: &str, params: Value) -> Self {
        Self {
            method: method.to_string(),
            params: Some(params),
        }
    }
}

/// Partial state pushed into the external action layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<String>>,
}

impl StateUpdate {
    pub fn chain(chain_id: u64) -> Self {
        Self {
            chain_id: Some(chain_id),
            accounts: None,
        }
    }

    pub fn accounts(accounts: Vec<String>) -> Self {
        Self {
            chain_id: None,
            accounts: Some(accounts),
        }
    }

    pub fn connected(chain_id: u64, accounts: Vec<String>) -> Self {
        Self {
            chain_id: Some(chain_id),
            accounts: Some(accounts),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Full description of a chain, as accepted by `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParameter {
    pub chain_id: u64,
    pub chain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_currency: Option<NativeCurrency>,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_urls: Option<Vec<String>>,
}

impl AddChainParameter {
    pub fn validate(&self) -> Result<(), ConnectorError> {
        validate_chain_id(self.chain_id)?;
        if self.rpc_urls.is_empty() {
            return Err(ConnectorError::Validation(format!(
                "chain {} has no rpc urls",
                self.chain_id
            )));
        }
        let explorers = self.block_explorer_urls.iter().flatten();
        for raw in self.rpc_urls.iter().chain(explorers) {
            Url::parse(raw)
                .map_err(|e| ConnectorError::Validation(format!("invalid url {}: {}", raw, e)))?;
        }
        Ok(())
    }

    /// Request payload with the chain id rendered as a hex quantity.
    pub fn to_request_params(&self) -> Result<Value, ConnectorError> {
        let mut value = serde_json::to_value(self)?;
        value["chainId"] = Value::String(chain_id_to_hex(self.chain_id));
        Ok(value)
    }
}

/// Chain an activation should end up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainTarget {
    Id(u64),
    Parameters(AddChainParameter),
}

impl ChainTarget {
    pub fn chain_id(&self) -> u64 {
        match self {
            ChainTarget::Id(id) => *id,
            ChainTarget::Parameters(params) => params.chain_id,
        }
    }

    pub fn parameters(&self) -> Option<&AddChainParameter> {
        match self {
            ChainTarget::Id(_) => None,
            ChainTarget::Parameters(params) => Some(params),
        }
    }
}

impl From<u64> for ChainTarget {
    fn from(id: u64) -> Self {
        ChainTarget::Id(id)
    }
}

impl From<AddChainParameter> for ChainTarget {
    fn from(params: AddChainParameter) -> Self {
        ChainTarget::Parameters(params)
    }
}

fn default_asset_type() -> String {
    "trc20".to_string()
}

/// Token the wallet should start tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchAssetParams {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_asset_type")]
    pub asset_type: String,
}

impl WatchAssetParams {
    pub fn to_request_params(&self) -> Value {
        json!({
            "type": self.asset_type,
            "options": {
                "address": self.address,
                "symbol": self.symbol,
                "decimals": self.decimals,
                "image": self.image,
            }
        })
    }
}

pub fn validate_chain_id(chain_id: u64) -> Result<(), ConnectorError> {
    if chain_id == 0 || chain_id > MAX_SAFE_CHAIN_ID {
        return Err(ConnectorError::Validation(format!(
            "invalid chain id {}",
            chain_id
        )));
    }
    Ok(())
}

/// Parse a chain id reported by a wallet; hex quantities and decimal strings are both seen in the wild.
pub fn parse_chain_id(raw: &str) -> Result<u64, ConnectorError> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|e| ConnectorError::Conversion(format!("invalid chain id {:?}: {}", raw, e)))
}

pub fn parse_chain_id_value(value: &Value) -> Result<u64, ConnectorError> {
    match value {
        Value::String(s) => parse_chain_id(s),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ConnectorError::Conversion(format!("invalid chain id {}", n))),
        other => Err(ConnectorError::Conversion(format!(
            "chain id must be a string or number, got {}",
            other
        ))),
    }
}

pub fn chain_id_to_hex(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

/// JS truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
