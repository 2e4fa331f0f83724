// JS-facing connector object
use crate::{parse_target, parse_transfer};
use js_sys::{Promise, Reflect};
use log::info;
use serde_json::Value;
use std::rc::Rc;
use tronlink_connector_core::wasm::{from_js, to_js, JsActions, WindowHost};
use tronlink_connector_core::{
    detect_provider, ConnectorError, DetectOptions, TronLinkConnector, WalletSigner,
    WatchAssetParams,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

type Connector = TronLinkConnector<WindowHost, JsActions>;

/// Turn a connector error into a JS `Error` carrying the wallet code when there is one
fn to_js_error(err: ConnectorError) -> JsValue {
    let js_err = js_sys::Error::new(&err.to_string());
    let code = match &err {
        ConnectorError::UserRejected { code, .. } => Some(*code),
        ConnectorError::Rpc(rpc) => Some(rpc.code),
        _ => None,
    };
    if let Some(code) = code {
        let _ = Reflect::set(&js_err, &JsValue::from_str("code"), &JsValue::from_f64(code as f64));
    }
    js_err.into()
}

fn options_from_js(options: &JsValue) -> Result<DetectOptions, JsValue> {
    DetectOptions::from_value(&from_js(options)).map_err(to_js_error)
}

fn json_result(value: &Value) -> Result<JsValue, JsValue> {
    to_js(value).map_err(|e| to_js_error(e.into()))
}

/// Resolve to whether TronLink showed up; bad options throw before any waiting
#[wasm_bindgen(js_name = detectTronLink)]
pub fn detect_tron_link(options: JsValue) -> Result<Promise, JsValue> {
    let options = options_from_js(&options)?;
    let host = WindowHost::new().map_err(to_js_error)?;
    Ok(future_to_promise(async move {
        let found = detect_provider(&host, &options).await.is_some();
        Ok(JsValue::from_bool(found))
    }))
}

#[wasm_bindgen]
pub struct TronLinkWallet {
    connector: Rc<Connector>,
}

#[wasm_bindgen]
impl TronLinkWallet {
    /// `actions` must expose `startActivation`, `update` and `resetState`
    #[wasm_bindgen(constructor)]
    pub fn new(actions: JsValue, options: JsValue) -> Result<TronLinkWallet, JsValue> {
        let options = options_from_js(&options)?;
        let host = Rc::new(WindowHost::new().map_err(to_js_error)?);
        let actions = Rc::new(JsActions::new(actions));
        info!("TronLink connector created (timeout {} ms)", options.timeout_ms);
        Ok(Self {
            connector: Rc::new(TronLinkConnector::new(host, actions, options)),
        })
    }

    #[wasm_bindgen(js_name = connectEagerly)]
    pub fn connect_eagerly(&self) -> Promise {
        let connector = self.connector.clone();
        future_to_promise(async move {
            connector.connect_eagerly().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// `target` may be omitted, a chain id, or add-chain parameters
    pub fn activate(&self, target: JsValue) -> Result<Promise, JsValue> {
        let target = parse_target(from_js(&target)).map_err(to_js_error)?;
        let connector = self.connector.clone();
        Ok(future_to_promise(async move {
            connector.activate(target).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        }))
    }

    #[wasm_bindgen(js_name = watchAsset)]
    pub fn watch_asset(&self, params: JsValue) -> Result<Promise, JsValue> {
        let params: WatchAssetParams = serde_json::from_value(from_js(&params))
            .map_err(|e| to_js_error(ConnectorError::Validation(format!("invalid asset: {}", e))))?;
        let connector = self.connector.clone();
        Ok(future_to_promise(async move {
            let watched = connector.watch_asset(&params).await.map_err(to_js_error)?;
            Ok(JsValue::from_bool(watched))
        }))
    }

    pub fn deactivate(&self) {
        self.connector.deactivate();
    }

    #[wasm_bindgen(js_name = isInstalled)]
    pub fn is_installed(&self) -> bool {
        self.connector.provider().is_some()
    }

    #[wasm_bindgen(js_name = getAddress)]
    pub fn get_address(&self) -> Promise {
        let signer = self.connector.signer();
        future_to_promise(async move {
            let address = signer.get_address().await.map_err(to_js_error)?;
            Ok(JsValue::from_str(&address))
        })
    }

    #[wasm_bindgen(js_name = signMessage)]
    pub fn sign_message(&self, message: String) -> Promise {
        let signer = self.connector.signer();
        future_to_promise(async move {
            let signature = signer.sign_message(&message).await.map_err(to_js_error)?;
            json_result(&signature)
        })
    }

    #[wasm_bindgen(js_name = signTransaction)]
    pub fn sign_transaction(&self, transaction: JsValue) -> Promise {
        let signer = self.connector.signer();
        let transaction = from_js(&transaction);
        future_to_promise(async move {
            let signed = signer.sign_transaction(transaction).await.map_err(to_js_error)?;
            json_result(&signed)
        })
    }

    #[wasm_bindgen(js_name = sendTransaction)]
    pub fn send_transaction(&self, to: String, value: f64) -> Result<Promise, JsValue> {
        let request = parse_transfer(to, value).map_err(to_js_error)?;
        let signer = self.connector.signer();
        Ok(future_to_promise(async move {
            let receipt = signer.send_transaction(request).await.map_err(to_js_error)?;
            json_result(&receipt)
        }))
    }

    #[wasm_bindgen(js_name = sendTransactionWithSign)]
    pub fn send_transaction_with_sign(&self, to: String, value: f64) -> Result<Promise, JsValue> {
        let request = parse_transfer(to, value).map_err(to_js_error)?;
        let signer = self.connector.transfer_signer();
        Ok(future_to_promise(async move {
            let receipt = signer
                .send_transaction_with_sign(request)
                .await
                .map_err(to_js_error)?;
            json_result(&receipt)
        }))
    }
}
