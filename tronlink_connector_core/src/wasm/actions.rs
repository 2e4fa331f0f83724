// Action layer supplied by the page as `{ startActivation, update, resetState }`
use super::utils::{call_method, to_js};
use crate::actions::{ActivationToken, Actions};
use crate::error::ConnectorError;
use crate::models::StateUpdate;
use js_sys::Function;
use log::warn;
use wasm_bindgen::{JsCast, JsValue};

pub struct JsActions {
    inner: JsValue,
}

impl JsActions {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }
}

impl Actions for JsActions {
    fn start_activation(&self) -> ActivationToken {
        let cancel = match call_method(&self.inner, "startActivation", &[]) {
            Ok(cancel) => cancel,
            Err(e) => {
                warn!("startActivation failed: {}", e);
                return ActivationToken::inert();
            }
        };
        match cancel.dyn_into::<Function>() {
            Ok(cancel) => ActivationToken::new(move || {
                if let Err(e) = cancel.call0(&JsValue::NULL) {
                    warn!("Activation cancel failed: {:?}", e);
                }
            }),
            Err(_) => ActivationToken::inert(),
        }
    }

    fn update(&self, update: StateUpdate) -> Result<(), ConnectorError> {
        let payload = to_js(&update)?;
        call_method(&self.inner, "update", &[payload])?;
        Ok(())
    }

    fn reset_state(&self) {
        if let Err(e) = call_method(&self.inner, "resetState", &[]) {
            warn!("resetState failed: {}", e);
        }
    }
}
