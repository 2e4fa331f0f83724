// External action layer - the state store the connector reports into

use crate::error::ConnectorError;
use crate::models::StateUpdate;
use log::debug;

/// Handle for one in-progress activation.
///
/// Consumed exactly once: `finish` after a committed update, `cancel` on any
/// other exit. A token dropped while still armed cancels itself.
pub struct ActivationToken {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl ActivationToken {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Token for a flow that never started an activation
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    pub fn is_armed(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn finish(mut self) {
        self.cancel = None;
    }
}

impl Drop for ActivationToken {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            debug!("Activation token dropped while armed, cancelling");
            cancel();
        }
    }
}

impl std::fmt::Debug for ActivationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationToken")
            .field("armed", &self.is_armed())
            .finish()
    }
}

pub trait Actions {
    fn start_activation(&self) -> ActivationToken;

    fn update(&self, update: StateUpdate) -> Result<(), ConnectorError>;

    fn reset_state(&self);
}
