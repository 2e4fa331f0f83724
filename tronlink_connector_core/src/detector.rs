// Injected provider detection
use crate::host::ProviderHost;
use crate::provider::Provider;
use crate::settings::DetectOptions;
use futures::channel::oneshot;
use futures_util::future::{self, Either};
use log::{debug, warn};
use std::cell::RefCell;
use std::rc::Rc;

/// How a detection attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionTrigger {
    /// The slot was already populated when detection started
    Immediate,
    /// The wallet announced itself via the initialization event
    InitializedEvent,
    /// The timer fired first
    Timeout,
}

/// Wait for the wallet to show up in the injection slot.
///
/// Never fails: absence (or a foreign wallet when `must_be_tronlink` is set)
/// resolves to `None`.
pub async fn detect_provider<H: ProviderHost + ?Sized>(
    host: &H,
    options: &DetectOptions,
) -> Option<Rc<dyn Provider>> {
    detect_provider_with_trigger(host, options).await.0
}

pub async fn detect_provider_with_trigger<H: ProviderHost + ?Sized>(
    host: &H,
    options: &DetectOptions,
) -> (Option<Rc<dyn Provider>>, DetectionTrigger) {
    if let Some(provider) = host.provider() {
        debug!("Provider already injected, skipping wait");
        return (accept(Some(provider), options), DetectionTrigger::Immediate);
    }

    let (tx, rx) = oneshot::channel::<()>();
    // Taking the sender is the latch: only the first firing can resolve.
    let latch = Rc::new(RefCell::new(Some(tx)));
    let event_latch = latch.clone();
    let listener = host.on_initialized(Box::new(move || {
        if let Some(tx) = event_latch.borrow_mut().take() {
            let _ = tx.send(());
        }
    }));

    let trigger = {
        let timer = host.sleep(options.timeout_ms);
        futures_util::pin_mut!(timer);
        match future::select(rx, timer).await {
            Either::Left(_) => DetectionTrigger::InitializedEvent,
            Either::Right(_) => {
                latch.borrow_mut().take();
                DetectionTrigger::Timeout
            }
        }
    };

    host.remove_initialized(listener);
    debug!("Provider detection finished via {:?}", trigger);
    (accept(host.provider(), options), trigger)
}

fn accept(provider: Option<Rc<dyn Provider>>, options: &DetectOptions) -> Option<Rc<dyn Provider>> {
    match provider {
        None => {
            if !options.silent {
                warn!("Unable to detect window.tron");
            }
            None
        }
        Some(provider) if options.must_be_tronlink && !provider.is_tronlink() => {
            if !options.silent {
                warn!("Non-TronLink provider detected");
            }
            None
        }
        Some(provider) => Some(provider),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ListenerId;
    use crate::testing::{MockHost, MockProvider};
    use async_trait::async_trait;
    use std::cell::Cell;
    use std::time::Duration;
    use tokio::time::Instant;

    fn options(timeout_ms: u64) -> DetectOptions {
        DetectOptions {
            timeout_ms,
            silent: true,
            must_be_tronlink: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_immediately_when_already_injected() {
        let host = MockHost::with_provider(Rc::new(MockProvider::tronlink()));
        let start = Instant::now();

        let (provider, trigger) = detect_provider_with_trigger(&host, &options(3000)).await;

        assert!(provider.is_some());
        assert_eq!(trigger, DetectionTrigger::Immediate);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(host.initialized_registrations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_to_none_when_never_injected() {
        for timeout in [0u64, 100, 3000] {
            let host = MockHost::new();
            let start = Instant::now();

            let (provider, trigger) = detect_provider_with_trigger(&host, &options(timeout)).await;

            assert!(provider.is_none());
            assert_eq!(trigger, DetectionTrigger::Timeout);
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(timeout));
            assert!(elapsed < Duration::from_millis(timeout + 5));
            assert_eq!(host.active_initialized_listeners(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_on_initialized_event() {
        let host = Rc::new(MockHost::new());
        let injector = host.clone();
        let local = tokio::task::LocalSet::new();

        let result = local
            .run_until(async move {
                tokio::task::spawn_local(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    injector.inject(Rc::new(MockProvider::tronlink()));
                });
                let start = Instant::now();
                let result = detect_provider_with_trigger(host.as_ref(), &options(3000)).await;
                (result, start.elapsed(), host.active_initialized_listeners())
            })
            .await;

        let ((provider, trigger), elapsed, listeners) = result;
        assert!(provider.is_some());
        assert_eq!(trigger, DetectionTrigger::InitializedEvent);
        assert!(elapsed < Duration::from_millis(3000));
        assert_eq!(listeners, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn late_event_after_timeout_is_ignored() {
        let host = MockHost::new();
        let (provider, trigger) = detect_provider_with_trigger(&host, &options(10)).await;
        assert!(provider.is_none());
        assert_eq!(trigger, DetectionTrigger::Timeout);

        // listener is gone, so a late injection must not reach the latch
        host.inject(Rc::new(MockProvider::tronlink()));
        assert_eq!(host.active_initialized_listeners(), 0);
    }

    /// Fires the initialization callback while it is being unregistered,
    /// i.e. after the timer already won the race.
    #[derive(Default)]
    struct LateEventHost {
        callback: RefCell<Option<Box<dyn FnOnce()>>>,
        fired: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl ProviderHost for LateEventHost {
        fn provider(&self) -> Option<Rc<dyn Provider>> {
            None
        }

        fn on_initialized(&self, callback: Box<dyn FnOnce()>) -> ListenerId {
            *self.callback.borrow_mut() = Some(callback);
            1
        }

        fn remove_initialized(&self, _id: ListenerId) {
            let callback = self.callback.borrow_mut().take();
            if let Some(callback) = callback {
                callback();
                self.fired.set(self.fired.get() + 1);
            }
        }

        async fn sleep(&self, ms: u64) {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn event_racing_listener_removal_after_timeout_is_dropped() {
        let host = LateEventHost::default();

        let (provider, trigger) = detect_provider_with_trigger(&host, &options(10)).await;

        assert_eq!(host.fired.get(), 1);
        assert!(provider.is_none());
        assert_eq!(trigger, DetectionTrigger::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn canonical_filter_rejects_foreign_wallet() {
        let host = MockHost::with_provider(Rc::new(MockProvider::new()));
        let strict = DetectOptions {
            must_be_tronlink: true,
            ..options(100)
        };
        assert!(detect_provider(&host, &strict).await.is_none());
        assert!(detect_provider(&host, &options(100)).await.is_some());
    }
}
