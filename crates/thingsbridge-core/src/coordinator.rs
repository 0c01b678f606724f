// ── Polling coordinator ──
//
// Owns the authoritative Snapshot for one configured endpoint.
// Refreshes on a fixed interval or on demand, publishes each new
// Snapshot by reference, and fans every refresh outcome out to
// registered observers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use thingsbridge_api::{AttributesClient, Endpoint};

use crate::config::EntryConfig;
use crate::error::CoreError;
use crate::flatten::flatten;
use crate::model::{AttributeKey, AttributeMap, Snapshot};

// ── State ────────────────────────────────────────────────────────

/// Which class of failure put the coordinator into `Degraded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Token rejected. Needs reconfiguration.
    Auth,
    /// Network, status, or payload failure. The next poll retries.
    Fetch,
}

/// Coordinator lifecycle, observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No refresh has succeeded yet.
    Uninitialized,
    /// The last refresh succeeded.
    Ready,
    /// The last refresh failed; the last-good Snapshot is still served.
    Degraded(FailureKind),
}

/// Passed to every observer after each refresh attempt.
///
/// All observers of one refresh receive the same `Arc<Snapshot>`.
#[derive(Debug, Clone)]
pub struct RefreshEvent {
    pub snapshot: Option<Arc<Snapshot>>,
    pub state: CoordinatorState,
}

impl RefreshEvent {
    pub fn succeeded(&self) -> bool {
        self.state == CoordinatorState::Ready
    }
}

type Observer = Arc<dyn Fn(&RefreshEvent) + Send + Sync>;
type ObserverTable = DashMap<u64, Observer>;

// ── Subscription ─────────────────────────────────────────────────

/// Handle returned by [`Coordinator::subscribe`]. Dropping it removes the
/// observer.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    observers: Weak<ObserverTable>,
    id: u64,
}

impl Subscription {
    /// Remove the observer now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// ── Coordinator ──────────────────────────────────────────────────

/// Single-writer, many-reader cache of one device's attributes.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. The `reqwest::Client`
/// is owned by the host and only ever cloned here, never closed.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: EntryConfig,
    client: AttributesClient,
    snapshot: ArcSwapOption<Snapshot>,
    state: watch::Sender<CoordinatorState>,
    /// Cleared only by a fetch failure. Auth failures leave it untouched
    /// so point availability stays as it was.
    last_update_success: AtomicBool,
    observers: Arc<ObserverTable>,
    next_observer_id: AtomicU64,
    cancel: CancellationToken,
    /// Child token + handle of the running poll task, if started.
    poll_task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl Coordinator {
    /// Create a coordinator for `config`, sharing the host's HTTP client.
    /// Does NOT fetch; call [`first_refresh`](Self::first_refresh).
    pub fn new(config: EntryConfig, http: reqwest::Client) -> Result<Self, CoreError> {
        let endpoint = Endpoint::new(&config.host, &config.access_token)?;
        let client = AttributesClient::with_client(http, endpoint);
        let (state, _) = watch::channel(CoordinatorState::Uninitialized);

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                snapshot: ArcSwapOption::empty(),
                state,
                last_update_success: AtomicBool::new(false),
                observers: Arc::new(DashMap::new()),
                next_observer_id: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                poll_task: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &EntryConfig {
        &self.inner.config
    }

    pub fn entry_id(&self) -> &str {
        &self.inner.config.entry_id
    }

    /// Normalized host of the configured endpoint.
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    // ── Observation ──────────────────────────────────────────────

    /// The current Snapshot (cheap `Arc` clone), if any refresh has succeeded.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot.load_full()
    }

    pub fn state(&self) -> CoordinatorState {
        *self.inner.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn state_changes(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state.subscribe()
    }

    /// `false` after a fetch failure until the next successful refresh.
    pub fn last_update_success(&self) -> bool {
        self.inner.last_update_success.load(Ordering::Acquire)
    }

    /// A point is available iff the last refresh did not fail to fetch and
    /// its key is in the current Snapshot.
    pub fn is_available(&self, key: &AttributeKey) -> bool {
        self.last_update_success()
            && self
                .inner
                .snapshot
                .load()
                .as_ref()
                .is_some_and(|snap| snap.contains(key))
    }

    /// Register `observer`, called after every refresh attempt.
    ///
    /// Observers run synchronously on the refreshing task, in no particular
    /// order. They must not block.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&RefreshEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.insert(id, Arc::new(observer));
        Subscription {
            observers: Arc::downgrade(&self.inner.observers),
            id,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Initial refresh, run before the entry is activated.
    ///
    /// A fetch failure becomes [`CoreError::NotReady`] so the host retries
    /// set-up later; an auth failure is returned as-is.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        match self.refresh().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) if e.is_auth() => Err(e),
            Err(e) => Err(CoreError::NotReady {
                entry_id: self.entry_id().to_owned(),
                reason: e.to_string(),
            }),
        }
    }

    /// Fetch, flatten, and publish a new Snapshot, then notify observers.
    ///
    /// On failure the previous Snapshot is kept and observers are still
    /// notified with the degraded state.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let fetched = self
            .inner
            .client
            .fetch_attributes(self.inner.config.refresh_timeout)
            .await
            .map_err(CoreError::from);

        let result = match fetched {
            Ok(response) => {
                let snapshot = Arc::new(Snapshot::new(flatten(response), Utc::now()));
                self.inner.snapshot.store(Some(Arc::clone(&snapshot)));
                self.inner.last_update_success.store(true, Ordering::Release);
                self.inner.state.send_replace(CoordinatorState::Ready);
                debug!(
                    entry_id = %self.entry_id(),
                    keys = snapshot.len(),
                    "attributes refreshed"
                );
                Ok(snapshot)
            }
            Err(e) => {
                let kind = if e.is_auth() {
                    FailureKind::Auth
                } else {
                    self.inner.last_update_success.store(false, Ordering::Release);
                    FailureKind::Fetch
                };
                // No last-good Snapshot yet: stay Uninitialized.
                if self.inner.snapshot.load().is_some() {
                    self.inner.state.send_replace(CoordinatorState::Degraded(kind));
                }
                warn!(entry_id = %self.entry_id(), error = %e, ?kind, "attribute refresh failed");
                Err(e)
            }
        };

        self.notify();
        result
    }

    /// POST bare name→value pairs, then re-poll so the Snapshot reflects
    /// the write.
    ///
    /// Returns `false` instead of an error on 401, non-200/201, or
    /// transport failure; no refresh is issued in that case. The follow-up
    /// refresh is awaited before returning, but its own failure does not
    /// turn a successful write into `false`.
    pub async fn write(&self, attributes: &AttributeMap) -> bool {
        let result = self
            .inner
            .client
            .post_attributes(attributes, self.inner.config.write_timeout)
            .await;

        match result {
            Ok(()) => {
                info!(
                    entry_id = %self.entry_id(),
                    names = ?attributes.keys().collect::<Vec<_>>(),
                    "attributes written"
                );
                if let Err(e) = self.refresh().await {
                    debug!(error = %e, "refresh after write failed");
                }
                true
            }
            Err(e) if e.is_auth() => {
                error!(entry_id = %self.entry_id(), "invalid access token when setting attributes");
                false
            }
            Err(e) => {
                error!(entry_id = %self.entry_id(), error = %e, "error setting attributes");
                false
            }
        }
    }

    // ── Periodic refresh ─────────────────────────────────────────

    /// Spawn the periodic refresh task. No-op if it is already running or
    /// the configured interval is zero.
    pub async fn start(&self) {
        let interval = self.inner.config.scan_interval;
        if interval.is_zero() {
            debug!(entry_id = %self.entry_id(), "periodic refresh disabled");
            return;
        }

        let mut slot = self.inner.poll_task.lock().await;
        if slot.is_some() {
            return;
        }

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(refresh_task(self.clone(), interval, cancel.clone()));
        *slot = Some((cancel, handle));
        debug!(entry_id = %self.entry_id(), ?interval, "periodic refresh started");
    }

    /// Stop the periodic refresh task and wait for it to exit.
    pub async fn shutdown(&self) {
        let task = self.inner.poll_task.lock().await.take();
        if let Some((cancel, handle)) = task {
            cancel.cancel();
            let _ = handle.await;
            debug!(entry_id = %self.entry_id(), "periodic refresh stopped");
        }
    }

    pub async fn is_polling(&self) -> bool {
        self.inner.poll_task.lock().await.is_some()
    }

    // ── Private helpers ──────────────────────────────────────────

    fn notify(&self) {
        let event = RefreshEvent {
            snapshot: self.snapshot(),
            state: self.state(),
        };
        // Collect first: observers may unsubscribe while running.
        let observers: Vec<Observer> = self
            .inner
            .observers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for observer in observers {
            observer(&event);
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("entry_id", &self.entry_id())
            .field("endpoint", self.inner.client.endpoint())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Periodically refresh the Snapshot until cancelled.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // Failures are logged and surfaced to observers by refresh().
                let _ = coordinator.refresh().await;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::sync::atomic::AtomicUsize;

    fn offline_coordinator() -> Coordinator {
        let config = EntryConfig::new(
            "entry-1",
            "ThingsBoard (http://127.0.0.1:1)",
            "http://127.0.0.1:1",
            SecretString::from("token".to_owned()),
        );
        Coordinator::new(config, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn starts_uninitialized_without_snapshot() {
        let coordinator = offline_coordinator();
        assert_eq!(coordinator.state(), CoordinatorState::Uninitialized);
        assert!(coordinator.snapshot().is_none());
        assert!(!coordinator.is_available(&AttributeKey::client("temp")));
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let coordinator = offline_coordinator();
        let sub = coordinator.subscribe(|_| {});
        let other = coordinator.subscribe(|_| {});
        assert_eq!(coordinator.observer_count(), 2);

        drop(sub);
        assert_eq!(coordinator.observer_count(), 1);
        other.unsubscribe();
        assert_eq!(coordinator.observer_count(), 0);
    }

    #[tokio::test]
    async fn failed_refresh_still_notifies() {
        let coordinator = offline_coordinator();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let _sub = coordinator.subscribe(move |event| {
            assert!(!event.succeeded());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(coordinator.refresh().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.state(), CoordinatorState::Uninitialized);
    }

    #[tokio::test]
    async fn transport_error_hides_token() {
        let config = EntryConfig::new(
            "entry-1",
            "t",
            "http://127.0.0.1:1",
            SecretString::from("SUPERSECRETTOKEN".to_owned()),
        );
        let coordinator = Coordinator::new(config, reqwest::Client::new()).unwrap();

        let err = coordinator.refresh().await.unwrap_err();
        assert!(!err.to_string().contains("SUPERSECRETTOKEN"), "{err}");
        assert!(!format!("{err:?}").contains("SUPERSECRETTOKEN"), "{err:?}");
    }

    #[tokio::test]
    async fn zero_interval_does_not_spawn() {
        let config = EntryConfig::new(
            "entry-1",
            "t",
            "http://127.0.0.1:1",
            SecretString::from("token".to_owned()),
        )
        .with_scan_interval(Duration::ZERO);
        let coordinator = Coordinator::new(config, reqwest::Client::new()).unwrap();

        coordinator.start().await;
        assert!(!coordinator.is_polling().await);
    }
}
