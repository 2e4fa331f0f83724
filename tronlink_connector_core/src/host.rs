// Page environment abstraction - the global provider slot, the wallet's
// initialization event, timers and the cross-context message channel

use crate::provider::Provider;
use crate::signer::SigningBackend;
use async_trait::async_trait;
use serde_json::Value;
use std::rc::Rc;

/// Handle for an `on_initialized` registration
pub type ListenerId = u64;

pub type MessageListener = Rc<dyn Fn(Value)>;

/// Name of the event TronLink dispatches on `window` once injected
pub const INITIALIZED_EVENT: &str = "tronLink#initialized";

#[async_trait(?Send)]
pub trait ProviderHost {
    /// Current content of the injection slot
    fn provider(&self) -> Option<Rc<dyn Provider>>;

    /// Register a one-shot callback for the initialization event
    fn on_initialized(&self, callback: Box<dyn FnOnce()>) -> ListenerId;

    /// Unregister an initialization callback; unknown ids are ignored
    fn remove_initialized(&self, id: ListenerId);

    /// Resolve after `ms` milliseconds
    async fn sleep(&self, ms: u64);

    /// Subscribe to raw cross-context messages posted to the page
    fn on_message(&self, _listener: MessageListener) {}

    /// Signing object injected next to the provider (`window.tronWeb`)
    fn signing_backend(&self) -> Option<Rc<dyn SigningBackend>> {
        None
    }
}
