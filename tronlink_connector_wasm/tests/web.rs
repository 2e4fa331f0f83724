#![cfg(target_arch = "wasm32")]

use js_sys::{Object, Promise, Reflect};
use tronlink_connector_wasm::{detect_tron_link, TronLinkWallet};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn options(entries: &[(&str, JsValue)]) -> JsValue {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value).unwrap();
    }
    object.into()
}

#[wasm_bindgen_test]
fn wrongly_typed_options_throw_synchronously() {
    let bad = options(&[("silent", JsValue::from_str("yes"))]);
    assert!(detect_tron_link(bad.clone()).is_err());
    assert!(TronLinkWallet::new(Object::new().into(), bad).is_err());
}

#[wasm_bindgen_test]
async fn detection_without_wallet_resolves_false() {
    let opts = options(&[
        ("timeoutMs", JsValue::from_f64(50.0)),
        ("silent", JsValue::TRUE),
    ]);
    let promise: Promise = detect_tron_link(opts).unwrap();
    let found = JsFuture::from(promise).await.unwrap();
    assert_eq!(found, JsValue::FALSE);
}

#[wasm_bindgen_test]
async fn activate_without_wallet_rejects() {
    let opts = options(&[
        ("timeoutMs", JsValue::from_f64(10.0)),
        ("silent", JsValue::TRUE),
    ]);
    let wallet = TronLinkWallet::new(Object::new().into(), opts).unwrap();
    let result = JsFuture::from(wallet.activate(JsValue::UNDEFINED).unwrap()).await;
    assert!(result.is_err());
    assert!(!wallet.is_installed());
}
