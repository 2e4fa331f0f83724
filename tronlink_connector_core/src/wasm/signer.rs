// WASM signing backend over `window.tronWeb`
// Signing happens inside the wallet; this only marshals arguments

use super::utils::{call_method_async, from_js, get, get_path, to_js};
use crate::error::ProviderRpcError;
use crate::provider::ProviderResult;
use crate::signer::SigningBackend;
use async_trait::async_trait;
use serde_json::Value;
use wasm_bindgen::JsValue;

pub struct JsTronWeb {
    inner: JsValue,
}

impl JsTronWeb {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }

    fn module(&self, name: &str) -> ProviderResult<JsValue> {
        get(&self.inner, name)
            .ok_or_else(|| ProviderRpcError::new(-32601, format!("tronWeb.{} is unavailable", name)))
    }
}

#[async_trait(?Send)]
impl SigningBackend for JsTronWeb {
    fn default_address(&self) -> Option<String> {
        get_path(&self.inner, &["defaultAddress", "base58"]).and_then(|a| a.as_string())
    }

    async fn sign(&self, payload: Value) -> ProviderResult<Value> {
        let trx = self.module("trx")?;
        let signed = call_method_async(&trx, "sign", &[to_js(&payload)?]).await?;
        Ok(from_js(&signed))
    }

    async fn send_transaction(&self, transaction: Value) -> ProviderResult<Value> {
        let trx = self.module("trx")?;
        let to = to_js(&transaction["to"])?;
        let value = to_js(&transaction["value"])?;
        let receipt = call_method_async(&trx, "sendTransaction", &[to, value]).await?;
        Ok(from_js(&receipt))
    }

    async fn build_transfer(&self, to: &str, amount: u64, from: &str) -> ProviderResult<Value> {
        let builder = self.module("transactionBuilder")?;
        let unsigned = call_method_async(
            &builder,
            "sendTrx",
            &[
                JsValue::from_str(to),
                JsValue::from_f64(amount as f64),
                JsValue::from_str(from),
            ],
        )
        .await?;
        Ok(from_js(&unsigned))
    }

    async fn broadcast(&self, signed: Value) -> ProviderResult<Value> {
        let trx = self.module("trx")?;
        let receipt = call_method_async(&trx, "sendRawTransaction", &[to_js(&signed)?]).await?;
        Ok(from_js(&receipt))
    }
}
