// Scripted stand-ins for the wallet, the page and the state store

use crate::actions::{ActivationToken, Actions};
use crate::error::{ConnectorError, ProviderRpcError};
use crate::host::{ListenerId, MessageListener, ProviderHost};
use crate::models::{RequestArguments, StateUpdate};
use crate::provider::{EventListener, Provider, ProviderEvent, ProviderResult};
use crate::signer::SigningBackend;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

/// Provider whose replies are scripted per method
pub struct MockProvider {
    tronlink: bool,
    connected: bool,
    siblings: Vec<Rc<dyn Provider>>,
    queued: RefCell<HashMap<String, VecDeque<ProviderResult<Value>>>>,
    sticky: RefCell<HashMap<String, ProviderResult<Value>>>,
    calls: RefCell<Vec<RequestArguments>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            tronlink: false,
            connected: false,
            siblings: Vec::new(),
            queued: RefCell::new(HashMap::new()),
            sticky: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn tronlink() -> Self {
        Self {
            tronlink: true,
            ..Self::new()
        }
    }

    pub fn container(siblings: Vec<Rc<dyn Provider>>) -> Self {
        Self {
            siblings,
            ..Self::new()
        }
    }

    pub fn connected(mut self) -> Self {
        self.connected = true;
        self
    }

    /// Reply used whenever no one-shot reply is queued
    pub fn respond(&self, method: &str, reply: ProviderResult<Value>) {
        self.sticky.borrow_mut().insert(method.to_string(), reply);
    }

    /// Reply used once, before any sticky reply
    pub fn respond_once(&self, method: &str, reply: ProviderResult<Value>) {
        self.queued
            .borrow_mut()
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.method == method).count()
    }

    pub fn params_of(&self, method: &str) -> Vec<Value> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.method == method)
            .map(|c| c.params.clone().unwrap_or(Value::Null))
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn emit(&self, event: ProviderEvent) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(event.clone());
        }
    }
}

#[async_trait(?Send)]
impl Provider for MockProvider {
    async fn request(&self, args: RequestArguments) -> ProviderResult<Value> {
        let method = args.method.clone();
        self.calls.borrow_mut().push(args);
        tokio::task::yield_now().await;

        if let Some(reply) = self
            .queued
            .borrow_mut()
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.sticky
            .borrow()
            .get(&method)
            .cloned()
            .unwrap_or_else(|| Err(ProviderRpcError::new(-32601, format!("{} not scripted", method))))
    }

    fn on(&self, listener: EventListener) {
        self.listeners.borrow_mut().push(listener);
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_tronlink(&self) -> bool {
        self.tronlink
    }

    fn sibling_providers(&self) -> Vec<Rc<dyn Provider>> {
        self.siblings.clone()
    }
}

/// Page with an injection slot that can be filled later
pub struct MockHost {
    slot: RefCell<Option<Rc<dyn Provider>>>,
    initialized: RefCell<Vec<(ListenerId, Box<dyn FnOnce()>)>>,
    next_id: Cell<ListenerId>,
    registrations: Cell<usize>,
    provider_reads: Cell<usize>,
    message_listeners: RefCell<Vec<MessageListener>>,
    backend: Option<Rc<dyn SigningBackend>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            slot: RefCell::new(None),
            initialized: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            registrations: Cell::new(0),
            provider_reads: Cell::new(0),
            message_listeners: RefCell::new(Vec::new()),
            backend: None,
        }
    }

    pub fn with_provider(provider: Rc<dyn Provider>) -> Self {
        let host = Self::new();
        *host.slot.borrow_mut() = Some(provider);
        host
    }

    pub fn with_backend(mut self, backend: Rc<dyn SigningBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Fill the slot and fire the initialization event
    pub fn inject(&self, provider: Rc<dyn Provider>) {
        *self.slot.borrow_mut() = Some(provider);
        let callbacks: Vec<_> = self.initialized.borrow_mut().drain(..).collect();
        for (_, callback) in callbacks {
            callback();
        }
    }

    pub fn post_message(&self, data: Value) {
        let listeners = self.message_listeners.borrow().clone();
        for listener in listeners {
            listener(data.clone());
        }
    }

    pub fn initialized_registrations(&self) -> usize {
        self.registrations.get()
    }

    pub fn active_initialized_listeners(&self) -> usize {
        self.initialized.borrow().len()
    }

    pub fn provider_reads(&self) -> usize {
        self.provider_reads.get()
    }

    pub fn message_listener_count(&self) -> usize {
        self.message_listeners.borrow().len()
    }
}

#[async_trait(?Send)]
impl ProviderHost for MockHost {
    fn provider(&self) -> Option<Rc<dyn Provider>> {
        self.provider_reads.set(self.provider_reads.get() + 1);
        self.slot.borrow().clone()
    }

    fn on_initialized(&self, callback: Box<dyn FnOnce()>) -> ListenerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.registrations.set(self.registrations.get() + 1);
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
        self.backend.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionCall {
    StartActivation,
    Cancel,
    Update(StateUpdate),
    Reset,
}

/// Action layer that records every call
pub struct RecordingActions {
    calls: Rc<RefCell<Vec<ActionCall>>>,
}

impl RecordingActions {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<ActionCall> {
        self.calls.borrow().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| **c == ActionCall::Cancel)
            .count()
    }
}

impl Actions for RecordingActions {
    fn start_activation(&self) -> ActivationToken {
        self.calls.borrow_mut().push(ActionCall::StartActivation);
        let calls = self.calls.clone();
        ActivationToken::new(move || calls.borrow_mut().push(ActionCall::Cancel))
    }

    fn update(&self, update: StateUpdate) -> Result<(), ConnectorError> {
        self.calls.borrow_mut().push(ActionCall::Update(update));
        Ok(())
    }

    fn reset_state(&self) {
        self.calls.borrow_mut().push(ActionCall::Reset);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Sign(Value),
    SendTransaction(Value),
    BuildTransfer(String, u64, String),
    Broadcast(Value),
}

/// Signing object that echoes what it was asked to do
pub struct MockSigningBackend {
    address: Option<String>,
    sign_error: Option<ProviderRpcError>,
    calls: RefCell<Vec<BackendCall>>,
}

impl MockSigningBackend {
    pub fn new(address: Option<&str>) -> Self {
        Self {
            address: address.map(str::to_string),
            sign_error: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_sign(mut self, code: i64, message: &str) -> Self {
        self.sign_error = Some(ProviderRpcError::new(code, message));
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

#[async_trait(?Send)]
impl SigningBackend for MockSigningBackend {
    fn default_address(&self) -> Option<String> {
        self.address.clone()
    }

    async fn sign(&self, payload: Value) -> ProviderResult<Value> {
        self.calls.borrow_mut().push(BackendCall::Sign(payload.clone()));
        if let Some(err) = &self.sign_error {
            return Err(err.clone());
        }
        Ok(match payload {
            Value::String(message) => Value::String(format!("sig:{}", message)),
            mut transaction => {
                transaction["signature"] = json!(["sig"]);
                transaction
            }
        })
    }

    async fn send_transaction(&self, transaction: Value) -> ProviderResult<Value> {
        self.calls
            .borrow_mut()
            .push(BackendCall::SendTransaction(transaction));
        Ok(json!({ "result": true }))
    }

    async fn build_transfer(&self, to: &str, amount: u64, from: &str) -> ProviderResult<Value> {
        self.calls.borrow_mut().push(BackendCall::BuildTransfer(
            to.to_string(),
            amount,
            from.to_string(),
        ));
        Ok(json!({ "txID": "abc", "raw_data": { "to": to, "amount": amount } }))
    }

    async fn broadcast(&self, signed: Value) -> ProviderResult<Value> {
        self.calls.borrow_mut().push(BackendCall::Broadcast(signed));
        Ok(json!({ "result": true, "txid": "abc" }))
    }
}
