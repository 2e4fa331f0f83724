// WASM utility functions

use crate::error::ProviderRpcError;
use js_sys::{Array, Function, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// JSON-RPC "internal error", used when a rejection carries no code
const INTERNAL_ERROR: i64 = -32603;
const INVALID_PARAMS: i64 = -32602;
const METHOD_NOT_FOUND: i64 = -32601;

/// Sleep for the specified number of milliseconds using browser's setTimeout
pub async fn sleep_ms(milliseconds: u64) {
    let timeout = milliseconds.min(i32::MAX as u64) as i32;
    let promise = Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// Property lookup treating `undefined`, `null` and `false` as absent
pub fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    let value = Reflect::get(target, &JsValue::from_str(key)).ok()?;
    if value.is_undefined() || value.is_null() || value == JsValue::FALSE {
        None
    } else {
        Some(value)
    }
}

pub fn get_path(target: &JsValue, path: &[&str]) -> Option<JsValue> {
    path.iter()
        .try_fold(target.clone(), |current, key| get(&current, key))
}

/// Convert a rejection value into a provider error, keeping code/message/data when present
pub fn js_error(err: JsValue) -> ProviderRpcError {
    if let Ok(parsed) = serde_wasm_bindgen::from_value::<ProviderRpcError>(err.clone()) {
        return parsed;
    }
    let message = err
        .as_string()
        .or_else(|| get(&err, "message").and_then(|m| m.as_string()))
        .unwrap_or_else(|| format!("{:?}", err));
    ProviderRpcError::new(INTERNAL_ERROR, message)
}

pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, ProviderRpcError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ProviderRpcError::new(INVALID_PARAMS, e.to_string()))
}

pub fn from_js(value: &JsValue) -> Value {
    if value.is_undefined() {
        return Value::Null;
    }
    serde_wasm_bindgen::from_value(value.clone()).unwrap_or(Value::Null)
}

/// Invoke `target[name](...args)` synchronously
pub fn call_method(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, ProviderRpcError> {
    let function: Function = Reflect::get(target, &JsValue::from_str(name))
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| ProviderRpcError::new(METHOD_NOT_FOUND, format!("{} is not a function", name)))?;
    let call_args = Array::new();
    for arg in args {
        call_args.push(arg);
    }
    function.apply(target, &call_args).map_err(js_error)
}

/// Invoke a method and await its result if it returned a promise
pub async fn call_method_async(
    target: &JsValue,
    name: &str,
    args: &[JsValue],
) -> Result<JsValue, ProviderRpcError> {
    let returned = call_method(target, name, args)?;
    JsFuture::from(Promise::resolve(&returned))
        .await
        .map_err(js_error)
}
