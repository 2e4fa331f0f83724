// In-memory connection state store implementing the action layer

use crate::actions::{ActivationToken, Actions};
use crate::error::ConnectorError;
use crate::models::{validate_chain_id, StateUpdate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Connection state as seen by the application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorState {
    pub chain_id: Option<u64>,
    pub accounts: Option<Vec<String>>,
    pub activating: bool,
}

impl ConnectorState {
    pub fn is_active(&self) -> bool {
        self.chain_id.is_some() && self.accounts.as_ref().is_some_and(|a| !a.is_empty())
    }
}

pub type StateListener = Rc<dyn Fn(&ConnectorState)>;

struct Inner {
    state: RefCell<ConnectorState>,
    // Bumped by every start/update/reset so a stale cancel cannot clear a newer activation.
    nonce: Cell<u64>,
    listeners: RefCell<Vec<StateListener>>,
}

impl Inner {
    fn bump(&self) -> u64 {
        let next = self.nonce.get() + 1;
        self.nonce.set(next);
        next
    }

    fn set(&self, next: ConnectorState) {
        *self.state.borrow_mut() = next.clone();
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&next);
        }
    }
}

/// Reference action layer; clones share the same state
#[derive(Clone)]
pub struct StateStore {
    inner: Rc<Inner>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(ConnectorState::default()),
                nonce: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> ConnectorState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self, listener: StateListener) {
        self.inner.listeners.borrow_mut().push(listener);
    }
}

impl Actions for StateStore {
    fn start_activation(&self) -> ActivationToken {
        let nonce = self.inner.bump();
        let mut next = self.state();
        next.activating = true;
        self.inner.set(next);

        let inner = Rc::downgrade(&self.inner);
        ActivationToken::new(move || {
            let Some(inner) = inner.upgrade() else { return };
            if inner.nonce.get() != nonce {
                debug!("Ignoring stale activation cancel");
                return;
            }
            let mut next = inner.state.borrow().clone();
            next.activating = false;
            inner.set(next);
        })
    }

    fn update(&self, update: StateUpdate) -> Result<(), ConnectorError> {
        if let Some(chain_id) = update.chain_id {
            validate_chain_id(chain_id)?;
        }
        if let Some(accounts) = &update.accounts {
            for account in accounts {
                validate_account(account)?;
            }
        }

        self.inner.bump();
        let mut next = self.state();
        if let Some(chain_id) = update.chain_id {
            next.chain_id = Some(chain_id);
        }
        if let Some(accounts) = update.accounts {
            next.accounts = Some(accounts);
        }
        if next.activating && next.chain_id.is_some() && next.accounts.is_some() {
            next.activating = false;
        }
        self.inner.set(next);
        Ok(())
    }

    fn reset_state(&self) {
        self.inner.bump();
        self.inner.set(ConnectorState::default());
    }
}

/// Accept base58check TRON addresses (version byte 0x41) and 20-byte `0x` hex addresses
pub fn validate_account(account: &str) -> Result<(), ConnectorError> {
    if let Some(hex_body) = account.strip_prefix("0x") {
        return match hex::decode(hex_body) {
            Ok(bytes) if bytes.len() == 20 => Ok(()),
            _ => Err(invalid_account(account)),
        };
    }

    match bs58::decode(account).with_check(None).into_vec() {
        Ok(bytes) if bytes.len() == 21 && bytes[0] == 0x41 => Ok(()),
        Ok(_) | Err(_) => {
            warn!("Rejecting account {}", account);
            Err(invalid_account(account))
        }
    }
}

fn invalid_account(account: &str) -> ConnectorError {
    ConnectorError::Validation(format!("invalid account {}", account))
}
