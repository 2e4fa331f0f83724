// TronLink connection lifecycle
//
// detect -> initialize -> connect eagerly / activate -> listen -> reset.
// Detection and listener wiring run once per connector; every entry point
// awaits the same initialization.

use crate::actions::{ActivationToken, Actions};
use crate::detector::detect_provider;
use crate::error::ConnectorError;
use crate::host::ProviderHost;
use crate::messages::handle_raw_message;
use crate::models::{
    chain_id_to_hex, is_truthy, parse_chain_id, parse_chain_id_value, ChainTarget,
    RequestArguments, StateUpdate, WatchAssetParams,
};
use crate::provider::{methods, select_provider, Provider, ProviderEvent};
use crate::settings::{ConnectorSettings, DetectOptions};
use crate::signer::{TransferSigner, TronWebSigner};
use futures::channel::oneshot;
use futures_util::future::LocalBoxFuture;
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub type ErrorCallback = Rc<dyn Fn(ConnectorError)>;

/// Code TronLink uses for an accepted account request
const WALLET_OK_CODE: i64 = 200;

enum InitState {
    Uninitialized,
    Initializing(Vec<oneshot::Sender<()>>),
    Ready,
}

/// Observable initialization progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Uninitialized,
    Initializing,
    Ready { provider: bool },
}

pub struct TronLinkConnector<H: ProviderHost + 'static, A: Actions + 'static> {
    host: Rc<H>,
    actions: Rc<A>,
    options: DetectOptions,
    default_chain: Option<ChainTarget>,
    on_error: Option<ErrorCallback>,
    init: RefCell<InitState>,
    provider: RefCell<Option<Rc<dyn Provider>>>,
}

impl<H: ProviderHost + 'static, A: Actions + 'static> TronLinkConnector<H, A> {
    pub fn new(host: Rc<H>, actions: Rc<A>, options: DetectOptions) -> Self {
        Self {
            host,
            actions,
            options,
            default_chain: None,
            on_error: None,
            init: RefCell::new(InitState::Uninitialized),
            provider: RefCell::new(None),
        }
    }

    pub fn from_settings(host: Rc<H>, actions: Rc<A>, settings: &ConnectorSettings) -> Self {
        let mut connector = Self::new(host, actions, settings.detect.clone());
        connector.default_chain = settings.default_chain.clone();
        connector
    }

    /// Called with the wallet's error when it emits `disconnect`
    pub fn with_error_handler(mut self, on_error: ErrorCallback) -> Self {
        self.on_error = Some(on_error);
        self
    }

    pub fn provider(&self) -> Option<Rc<dyn Provider>> {
        self.provider.borrow().clone()
    }

    pub fn actions(&self) -> &Rc<A> {
        &self.actions
    }

    pub fn init_status(&self) -> InitStatus {
        match &*self.init.borrow() {
            InitState::Uninitialized => InitStatus::Uninitialized,
            InitState::Initializing(_) => InitStatus::Initializing,
            InitState::Ready => InitStatus::Ready {
                provider: self.provider.borrow().is_some(),
            },
        }
    }

    /// Ethereum-style signer over the page's signing object
    pub fn signer(&self) -> TronWebSigner {
        TronWebSigner::new(self.host.signing_backend())
    }

    /// Chain-native transfer signer over the page's signing object
    pub fn transfer_signer(&self) -> TransferSigner {
        TransferSigner::new(self.host.signing_backend())
    }

    /// Detect the provider and wire its listeners, once.
    pub async fn initialize(&self) {
        loop {
            let waiter = {
                let mut state = self.init.borrow_mut();
                match &mut *state {
                    InitState::Ready => return,
                    InitState::Initializing(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        Some(rx)
                    }
                    InitState::Uninitialized => {
                        *state = InitState::Initializing(Vec::new());
                        None
                    }
                }
            };

            match waiter {
                None => return self.run_initialization().await,
                Some(rx) => {
                    if rx.await.is_ok() {
                        return;
                    }
                    // the running initialization was dropped; take over
                    debug!("Initialization abandoned, retrying");
                }
            }
        }
    }

    async fn run_initialization(&self) {
        let guard = AbandonGuard { init: &self.init };

        let detected = detect_provider(self.host.as_ref(), &self.options).await;
        if let Some(provider) = detected.and_then(select_provider) {
            self.attach_listeners(provider.as_ref());
            *self.provider.borrow_mut() = Some(provider);
        }

        guard.complete();
    }

    fn attach_listeners(&self, provider: &dyn Provider) {
        let actions = self.actions.clone();
        let on_error = self.on_error.clone();
        provider.on(Rc::new(move |event: ProviderEvent| {
            apply_provider_event(&*actions, on_error.as_ref(), event)
        }));

        let actions = self.actions.clone();
        self.host
            .on_message(Rc::new(move |data: Value| handle_raw_message(&data, &*actions)));
        debug!("Provider listeners attached");
    }

    /// Reconnect without prompting; a missing wallet or a denied session is not an error.
    pub async fn connect_eagerly(&self) {
        let token = self.actions.start_activation();
        self.initialize().await;

        let Some(provider) = self.provider() else {
            debug!("No provider, skipping eager connection");
            token.cancel();
            return;
        };

        let session = read_session(provider.as_ref(), methods::ACCOUNTS).await;
        // A wallet that answers but grants no session resets rather than cancels.
        token.finish();
        match session {
            Ok((chain_id, accounts)) if !accounts.is_empty() => {
                match self.actions.update(StateUpdate::connected(chain_id, accounts)) {
                    Ok(()) => info!("Eagerly connected on chain {}", chain_id),
                    Err(e) => {
                        debug!("Could not connect eagerly: {}", e);
                        self.actions.reset_state();
                    }
                }
            }
            Ok(_) => {
                debug!("Could not connect eagerly: no accounts returned");
                self.actions.reset_state();
            }
            Err(e) => {
                debug!("Could not connect eagerly: {}", e);
                self.actions.reset_state();
            }
        }
    }

    /// Prompt the wallet for accounts, switching (or adding) the desired chain when given.
    pub async fn activate(&self, target: Option<ChainTarget>) -> Result<(), ConnectorError> {
        let connected = self.provider().is_some_and(|p| p.is_connected());
        let token = if connected {
            ActivationToken::inert()
        } else {
            self.actions.start_activation()
        };

        match self.try_activate(target, true).await {
            Ok(()) => {
                token.finish();
                Ok(())
            }
            Err(e) => {
                debug!("Activation failed: {}", e);
                token.cancel();
                Err(e)
            }
        }
    }

    /// `activate` towards the configured default chain
    pub async fn activate_default(&self) -> Result<(), ConnectorError> {
        self.activate(self.default_chain.clone()).await
    }

    fn try_activate(
        &self,
        target: Option<ChainTarget>,
        may_switch: bool,
    ) -> LocalBoxFuture<'_, Result<(), ConnectorError>> {
        Box::pin(async move {
            self.initialize().await;
            let provider = self.provider().ok_or(ConnectorError::NotInstalled)?;

            let (chain_id, accounts) = request_session(provider.as_ref()).await?;
            if accounts.is_empty() {
                self.actions.reset_state();
                return Err(ConnectorError::rejected("No accounts returned"));
            }

            let desired = match target.as_ref().map(ChainTarget::chain_id) {
                Some(desired) if desired != chain_id => desired,
                _ => {
                    self.actions.update(StateUpdate::connected(chain_id, accounts))?;
                    info!("Activated on chain {}", chain_id);
                    return Ok(());
                }
            };

            if !may_switch {
                return Err(ConnectorError::ChainMismatch {
                    expected: desired,
                    actual: chain_id,
                });
            }

            let hex_id = chain_id_to_hex(desired);
            debug!("Switching wallet from chain {} to {}", chain_id, hex_id);
            let switched = provider
                .request(RequestArguments::with_params(
                    methods::SWITCH_CHAIN,
                    json!([{ "chainId": hex_id }]),
                ))
                .await;

            if let Err(e) = switched {
                match target.as_ref().and_then(ChainTarget::parameters) {
                    Some(params) if e.is_unrecognized_chain() => {
                        params.validate()?;
                        debug!("Chain {} unknown to wallet, adding it", hex_id);
                        provider
                            .request(RequestArguments::with_params(
                                methods::ADD_CHAIN,
                                json!([params.to_request_params()?]),
                            ))
                            .await?;
                    }
                    _ => return Err(e.into()),
                }
            }

            self.try_activate(Some(ChainTarget::Id(desired)), false).await
        })
    }

    /// Ask the wallet to track a token; a falsy reply means the user declined.
    pub async fn watch_asset(&self, params: &WatchAssetParams) -> Result<bool, ConnectorError> {
        let provider = self.provider().ok_or(ConnectorError::NoProvider)?;
        let result = provider
            .request(RequestArguments::with_params(
                methods::WATCH_ASSET,
                params.to_request_params(),
            ))
            .await?;

        if !is_truthy(&result) {
            return Err(ConnectorError::rejected("Rejected watch asset request"));
        }
        Ok(true)
    }

    /// Drop the session on the application side; the wallet keeps its own.
    pub fn deactivate(&self) {
        self.actions.reset_state();
    }
}

/// Resets the init state if an initialization future is dropped mid-detection.
struct AbandonGuard<'a> {
    init: &'a RefCell<InitState>,
}

impl AbandonGuard<'_> {
    fn complete(self) {
        let previous = std::mem::replace(&mut *self.init.borrow_mut(), InitState::Ready);
        std::mem::forget(self);
        if let InitState::Initializing(waiters) = previous {
            for waiter in waiters {
                let _ = waiter.send(());
            }
        }
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        // dropping the waiters wakes them with `Canceled`
        *self.init.borrow_mut() = InitState::Uninitialized;
    }
}

/// Translate one wallet event into action calls.
pub fn apply_provider_event<A: Actions + ?Sized>(
    actions: &A,
    on_error: Option<&ErrorCallback>,
    event: ProviderEvent,
) {
    debug!("Provider event: {}", event.name());
    match event {
        ProviderEvent::Connect { chain_id } | ProviderEvent::ChainChanged(chain_id) => {
            let result = parse_chain_id(&chain_id)
                .and_then(|id| actions.update(StateUpdate::chain(id)));
            if let Err(e) = result {
                warn!("Ignoring chain notification {:?}: {}", chain_id, e);
            }
        }
        ProviderEvent::AccountsChanged(accounts) => {
            if accounts.is_empty() {
                actions.reset_state();
            } else if let Err(e) = actions.update(StateUpdate::accounts(accounts)) {
                warn!("Ignoring accountsChanged: {}", e);
            }
        }
        ProviderEvent::Disconnect(error) => {
            actions.reset_state();
            if let Some(on_error) = on_error {
                on_error(ConnectorError::Rpc(error));
            }
        }
    }
}

/// Chain id and accounts, requested concurrently; nothing is returned unless both succeed.
async fn read_session(
    provider: &dyn Provider,
    accounts_method: &str,
) -> Result<(u64, Vec<String>), ConnectorError> {
    let (chain_id, accounts) = futures_util::join!(
        provider.request(RequestArguments::new(methods::CHAIN_ID)),
        provider.request(RequestArguments::new(accounts_method)),
    );
    Ok((parse_chain_id_value(&chain_id?)?, parse_accounts(accounts?)?))
}

/// Explicit account request. TronLink may answer with a `{code, message}`
/// reply instead of the account list.
async fn request_session(provider: &dyn Provider) -> Result<(u64, Vec<String>), ConnectorError> {
    let (chain_id, requested) = futures_util::join!(
        provider.request(RequestArguments::new(methods::CHAIN_ID)),
        provider.request(RequestArguments::new(methods::REQUEST_ACCOUNTS)),
    );
    let chain_id = parse_chain_id_value(&chain_id?)?;
    let requested = requested?;

    let accounts = match wallet_reply_code(&requested) {
        None => parse_accounts(requested)?,
        Some(WALLET_OK_CODE) => {
            let accounts = provider
                .request(RequestArguments::new(methods::ACCOUNTS))
                .await?;
            parse_accounts(accounts)?
        }
        Some(code) => {
            let message = requested
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Account request rejected")
                .to_string();
            return Err(ConnectorError::UserRejected { code, message });
        }
    };
    Ok((chain_id, accounts))
}

fn wallet_reply_code(value: &Value) -> Option<i64> {
    value.as_object()?.get("code")?.as_i64()
}

fn parse_accounts(value: Value) -> Result<Vec<String>, ConnectorError> {
    serde_json::from_value(value.clone())
        .map_err(|_| ConnectorError::Conversion(format!("expected an account list, got {}", value)))
}
