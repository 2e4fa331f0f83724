// Native page host driven by tokio timers
// Embedders (webview bridges, integration harnesses) fill the slot themselves

use crate::host::{ListenerId, MessageListener, ProviderHost};
use crate::provider::Provider;
use crate::signer::SigningBackend;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Injection slot plus initialization and message channels
#[derive(Default)]
pub struct SlotHost {
    slot: RefCell<Option<Rc<dyn Provider>>>,
    backend: RefCell<Option<Rc<dyn SigningBackend>>>,
    initialized: RefCell<Vec<(ListenerId, Box<dyn FnOnce()>)>>,
    next_id: Cell<ListenerId>,
    message_listeners: RefCell<Vec<MessageListener>>,
}

impl SlotHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a provider in the slot and announce it
    pub fn inject(&self, provider: Rc<dyn Provider>) {
        *self.slot.borrow_mut() = Some(provider);
        let pending: Vec<_> = self.initialized.borrow_mut().drain(..).collect();
        debug!("Provider injected, notifying {} listener(s)", pending.len());
        for (_, callback) in pending {
            callback();
        }
    }

    pub fn set_signing_backend(&self, backend: Rc<dyn SigningBackend>) {
        *self.backend.borrow_mut() = Some(backend);
    }

    /// Deliver a page message to every subscriber
    pub fn post_message(&self, data: Value) {
        let listeners = self.message_listeners.borrow().clone();
        for listener in listeners {
            listener(data.clone());
        }
    }
}

#[async_trait(?Send)]
impl ProviderHost for SlotHost {
    fn provider(&self) -> Option<Rc<dyn Provider>> {
        self.slot.borrow().clone()
    }

    fn on_initialized(&self, callback: Box<dyn FnOnce()>) -> ListenerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.initialized.borrow_mut().push((id, callback));
        id
    }

    fn remove_initialized(&self, id: ListenerId) {
        self.initialized.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    async fn sleep(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn on_message(&self, listener: MessageListener) {
        self.message_listeners.borrow_mut().push(listener);
    }

    fn signing_backend(&self) -> Option<Rc<dyn SigningBackend>> {
        self.backend.borrow().clone()
    }
}
