// Browser window as the provider host
use super::provider::JsProvider;
use super::signer::JsTronWeb;
use super::utils::{from_js, get, sleep_ms};
use crate::error::ConnectorError;
use crate::host::{ListenerId, MessageListener, ProviderHost, INITIALIZED_EVENT};
use crate::provider::Provider;
use crate::signer::SigningBackend;
use async_trait::async_trait;
use log::warn;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, MessageEvent, Window};

/// Global slot TronLink injects its provider into
const PROVIDER_SLOT: &str = "tron";
/// Global slot holding the signing object
const SIGNER_SLOT: &str = "tronWeb";

pub struct WindowHost {
    window: Window,
    initialized: RefCell<HashMap<ListenerId, Closure<dyn FnMut(Event)>>>,
    next_id: Cell<ListenerId>,
    // These closures must be kept alive to maintain the event handlers
    message_handlers: RefCell<Vec<Closure<dyn FnMut(MessageEvent)>>>,
}

impl WindowHost {
    pub fn new() -> Result<Self, ConnectorError> {
        let window = web_sys::window()
            .ok_or_else(|| ConnectorError::Validation("No window".to_string()))?;
        Ok(Self {
            window,
            initialized: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            message_handlers: RefCell::new(Vec::new()),
        })
    }
}

#[async_trait(?Send)]
impl ProviderHost for WindowHost {
    fn provider(&self) -> Option<Rc<dyn Provider>> {
        get(&self.window, PROVIDER_SLOT).map(|p| Rc::new(JsProvider::new(p)) as Rc<dyn Provider>)
    }

    fn on_initialized(&self, callback: Box<dyn FnOnce()>) -> ListenerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let mut callback = Some(callback);
        let handler = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            if let Some(callback) = callback.take() {
                callback();
            }
        });
        if let Err(e) = self
            .window
            .add_event_listener_with_callback(INITIALIZED_EVENT, handler.as_ref().unchecked_ref())
        {
            warn!("Could not listen for {}: {:?}", INITIALIZED_EVENT, e);
        }
        self.initialized.borrow_mut().insert(id, handler);
        id
    }

    fn remove_initialized(&self, id: ListenerId) {
        if let Some(handler) = self.initialized.borrow_mut().remove(&id) {
            let _ = self.window.remove_event_listener_with_callback(
                INITIALIZED_EVENT,
                handler.as_ref().unchecked_ref(),
            );
        }
    }

    async fn sleep(&self, ms: u64) {
        sleep_ms(ms).await;
    }

    fn on_message(&self, listener: MessageListener) {
        let handler = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            listener(from_js(&event.data()));
        });
        if let Err(e) = self
            .window
            .add_event_listener_with_callback("message", handler.as_ref().unchecked_ref())
        {
            warn!("Could not listen for page messages: {:?}", e);
            return;
        }
        self.message_handlers.borrow_mut().push(handler);
    }

    fn signing_backend(&self) -> Option<Rc<dyn SigningBackend>> {
        get(&self.window, SIGNER_SLOT).map(|t| Rc::new(JsTronWeb::new(t)) as Rc<dyn SigningBackend>)
    }
}
