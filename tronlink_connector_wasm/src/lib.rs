// TronLink Connector WASM Bindings
// Browser-facing wrapper around the connector core

use serde_json::Value;
use tronlink_connector_core::{ChainTarget, ConnectorError, TransactionRequest};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wallet;
#[cfg(target_arch = "wasm32")]
pub use wallet::*;

// Initialize panic hook and logger for WASM
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// `activate` argument: nothing, a chain id, or full add-chain parameters
pub fn parse_target(raw: Value) -> Result<Option<ChainTarget>, ConnectorError> {
    match raw {
        Value::Null => Ok(None),
        other => {
            let target: ChainTarget = serde_json::from_value(other).map_err(|e| {
                ConnectorError::Validation(format!("invalid chain target: {}", e))
            })?;
            if let ChainTarget::Parameters(params) = &target {
                params.validate()?;
            }
            Ok(Some(target))
        }
    }
}

/// Transfer amounts arrive as JS numbers; only non-negative integers are accepted
pub fn parse_transfer(to: String, value: f64) -> Result<TransactionRequest, ConnectorError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return Err(ConnectorError::Validation(format!(
            "transfer amount must be a non-negative integer, got {}",
            value
        )));
    }
    Ok(TransactionRequest::transfer(to, value as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target(Value::Null).unwrap(), None);
        assert_eq!(parse_target(json!(56)).unwrap(), Some(ChainTarget::Id(56)));

        let full = parse_target(json!({
            "chainId": 56,
            "chainName": "BNB Smart Chain",
            "rpcUrls": ["https://bsc-dataseed.binance.org"]
        }))
        .unwrap()
        .unwrap();
        assert!(full.parameters().is_some());

        assert!(parse_target(json!("mainnet")).is_err());
        assert!(parse_target(json!({
            "chainId": 56,
            "chainName": "BNB Smart Chain",
            "rpcUrls": ["nope"]
        }))
        .is_err());
    }

    #[test]
    fn test_parse_transfer() {
        let request = parse_transfer("TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".to_string(), 1_000_000.0).unwrap();
        assert_eq!(request.value, 1_000_000);
        assert!(parse_transfer("T".to_string(), -1.0).is_err());
        assert!(parse_transfer("T".to_string(), 1.5).is_err());
        assert!(parse_transfer("T".to_string(), f64::NAN).is_err());
    }
}
