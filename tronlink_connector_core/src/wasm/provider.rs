// WASM provider wrapping the object TronLink injects as `window.tron`
use super::utils::{call_method, call_method_async, from_js, get, js_error, to_js};
use crate::models::RequestArguments;
use crate::provider::{EventListener, Provider, ProviderEvent, ProviderResult};
use async_trait::async_trait;
use js_sys::Array;
use log::{debug, warn};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const EVENTS: [&str; 4] = ["connect", "disconnect", "chainChanged", "accountsChanged"];

pub struct JsProvider {
    inner: JsValue,
    // Closures must be kept alive to maintain the event handlers
    handlers: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
}

impl JsProvider {
    pub fn new(inner: JsValue) -> Self {
        Self {
            inner,
            handlers: RefCell::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &JsValue {
        &self.inner
    }
}

fn decode_event(name: &str, payload: &JsValue) -> Option<ProviderEvent> {
    match name {
        "connect" => {
            let chain_id = get(payload, "chainId").and_then(|c| c.as_string())?;
            Some(ProviderEvent::Connect { chain_id })
        }
        "disconnect" => Some(ProviderEvent::Disconnect(js_error(payload.clone()))),
        "chainChanged" => payload.as_string().map(ProviderEvent::ChainChanged),
        "accountsChanged" => {
            let accounts = match from_js(payload) {
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|a| a.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            Some(ProviderEvent::AccountsChanged(accounts))
        }
        _ => None,
    }
}

#[async_trait(?Send)]
impl Provider for JsProvider {
    async fn request(&self, args: RequestArguments) -> ProviderResult<Value> {
        debug!("Provider request: {}", args.method);
        let payload = to_js(&args)?;
        let result = call_method_async(&self.inner, "request", &[payload]).await?;
        Ok(from_js(&result))
    }

    fn on(&self, listener: EventListener) {
        for name in EVENTS {
            let listener = listener.clone();
            let handler = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
                match decode_event(name, &payload) {
                    Some(event) => listener(event),
                    None => warn!("Malformed {} event", name),
                }
            });
            let callback: &JsValue = handler.as_ref();
            if let Err(e) = call_method(&self.inner, "on", &[JsValue::from_str(name), callback.clone()]) {
                warn!("Could not subscribe to {}: {}", name, e);
                continue;
            }
            self.handlers.borrow_mut().push(handler);
        }
    }

    fn is_connected(&self) -> bool {
        call_method(&self.inner, "isConnected", &[])
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn is_tronlink(&self) -> bool {
        get(&self.inner, "isTronLink").and_then(|v| v.as_bool()).unwrap_or(false)
    }

    fn sibling_providers(&self) -> Vec<Rc<dyn Provider>> {
        let Some(providers) = get(&self.inner, "providers") else {
            return Vec::new();
        };
        match providers.dyn_into::<Array>() {
            Ok(list) => list
                .iter()
                .map(|p| Rc::new(JsProvider::new(p)) as Rc<dyn Provider>)
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}
