// ── Keyed query cache ──
//
// One `Slot` per key: a `watch` channel carrying the published entry, plus
// a small control block (fetcher, fetch generation, cancellation handle)
// behind a mutex. Lock order is always control, then watch.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::entry::{QueryEntry, QueryStatus};
use super::subscription::Subscription;
use crate::config::CacheConfig;
use crate::error::CoreError;
use crate::model::QueryKey;

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Join the in-flight request if there is one.
    Dedupe,
    /// Cancel whatever is in flight and issue a fresh request.
    Supersede,
}

// ── Slot ────────────────────────────────────────────────────────────

pub(crate) struct Slot<T> {
    key: QueryKey,
    state: watch::Sender<QueryEntry<T>>,
    control: Mutex<Control<T>>,
    shutdown: CancellationToken,
}

struct Control<T> {
    /// Last fetcher a subscriber supplied; reused by `invalidate`.
    fetcher: Option<Fetcher<T>>,
    /// Bumped by every fetch start and every direct write. A fetch may only
    /// publish if the generation is still the one it started with.
    generation: u64,
    in_flight: Option<CancellationToken>,
    settled_at: Option<Instant>,
}

impl<T: Send + Sync + 'static> Slot<T> {
    fn new(key: QueryKey, shutdown: CancellationToken) -> Self {
        let (state, _) = watch::channel(QueryEntry::new(key.clone()));
        Self {
            key,
            state,
            control: Mutex::new(Control {
                fetcher: None,
                generation: 0,
                in_flight: None,
                settled_at: None,
            }),
            shutdown,
        }
    }

    pub(crate) fn key(&self) -> &QueryKey {
        &self.key
    }

    fn entry(&self) -> QueryEntry<T> {
        self.state.borrow().clone()
    }

    fn subscriber_count(&self) -> usize {
        self.state.borrow().subscriber_count
    }

    /// Register a subscriber. Count changes are published silently: they
    /// never wake `changed()`.
    fn attach(&self, fetcher: Fetcher<T>) -> watch::Receiver<QueryEntry<T>> {
        self.control.lock().fetcher = Some(fetcher);
        self.state.send_if_modified(|e| {
            e.subscriber_count += 1;
            false
        });
        self.state.subscribe()
    }

    /// Drop a subscriber. The last one out cancels any in-flight request;
    /// the entry itself stays cached.
    pub(crate) fn detach(&self) {
        let mut control = self.control.lock();
        let mut abandoned = false;
        self.state.send_if_modified(|e| {
            e.subscriber_count = e.subscriber_count.saturating_sub(1);
            if e.subscriber_count > 0 || !e.is_fetching {
                return false;
            }
            abandoned = true;
            e.is_fetching = false;
            if e.status.is_loading() {
                e.status = QueryStatus::Idle;
            }
            true
        });

        if abandoned {
            control.generation += 1;
            if let Some(token) = control.in_flight.take() {
                token.cancel();
            }
            debug!(key = %self.key, "last subscriber left, fetch cancelled");
        }
    }

    fn is_fresh(&self, config: &CacheConfig) -> bool {
        let settled_at = self.control.lock().settled_at;
        let stale = self.state.borrow().is_stale;
        !stale && settled_at.is_some_and(|t| t.elapsed() < config.stale_time)
    }

    /// Start a request unless `mode` says to join one already in flight.
    /// Returns `true` if a new request was issued.
    fn begin_fetch(self: &Arc<Self>, mode: FetchMode) -> bool {
        let mut control = self.control.lock();
        let Some(fetcher) = control.fetcher.clone() else {
            trace!(key = %self.key, "no fetcher registered");
            return false;
        };

        let in_flight = self.state.borrow().is_fetching;
        if in_flight && mode == FetchMode::Dedupe {
            trace!(key = %self.key, "joining in-flight fetch");
            return false;
        }

        if self.shutdown.is_cancelled() {
            drop(control);
            self.stop();
            return false;
        }

        if let Some(previous) = control.in_flight.take() {
            previous.cancel();
            debug!(key = %self.key, "in-flight fetch superseded");
        }
        control.generation += 1;
        let generation = control.generation;
        let token = self.shutdown.child_token();
        control.in_flight = Some(token.clone());

        self.state.send_modify(|e| {
            e.is_fetching = true;
            if matches!(e.status, QueryStatus::Idle) {
                e.status = QueryStatus::Loading;
            }
        });
        drop(control);

        debug!(key = %self.key, generation, "fetch started");
        let request = fetcher();
        let slot = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => None,
                result = request => Some(result),
            };
            match outcome {
                Some(result) => slot.settle(generation, result),
                None => trace!(key = %slot.key, generation, "fetch cancelled"),
            }
        });
        true
    }

    /// Publish a fetch result, unless something newer already replaced it.
    fn settle(&self, generation: u64, result: Result<T, CoreError>) {
        let mut control = self.control.lock();
        if control.generation != generation {
            trace!(key = %self.key, generation, "discarding superseded result");
            return;
        }
        control.in_flight = None;
        control.settled_at = Some(Instant::now());

        match result {
            Ok(value) => {
                debug!(key = %self.key, generation, "fetch succeeded");
                self.state.send_modify(|e| e.succeed(Arc::new(value)));
            }
            Err(err) => {
                warn!(key = %self.key, generation, error = %err, "fetch failed");
                self.state.send_modify(|e| e.fail(Arc::new(err)));
            }
        }
    }

    /// Overwrite with a known value; supersedes any in-flight request.
    fn put(&self, value: T) {
        let mut control = self.control.lock();
        control.generation += 1;
        if let Some(token) = control.in_flight.take() {
            token.cancel();
            debug!(key = %self.key, "in-flight fetch superseded by direct write");
        }
        control.settled_at = Some(Instant::now());
        self.state.send_modify(|e| e.succeed(Arc::new(value)));
    }

    fn mark_stale(&self) {
        self.state.send_if_modified(|e| {
            let changed = !e.is_stale;
            e.is_stale = true;
            changed
        });
    }

    /// Cancel any request and make sure nobody waits on a load that will
    /// never finish.
    fn stop(&self) {
        let mut control = self.control.lock();
        control.generation += 1;
        if let Some(token) = control.in_flight.take() {
            token.cancel();
        }
        self.state.send_if_modified(|e| {
            let waiting = e.is_fetching || !e.status.is_settled();
            if !waiting {
                return false;
            }
            e.is_fetching = false;
            if !e.status.is_settled() {
                e.status = QueryStatus::Error(Arc::new(CoreError::Shutdown));
            }
            true
        });
    }
}

// ── CacheStore ──────────────────────────────────────────────────────

/// Keyed cache of query results for one value type.
///
/// Concurrent subscriptions to a key share a single request. All methods
/// that can start a request must be called from within a Tokio runtime.
pub struct CacheStore<T: Send + Sync + 'static> {
    slots: DashMap<QueryKey, Arc<Slot<T>>>,
    config: CacheConfig,
    shutdown: CancellationToken,
}

impl<T: Send + Sync + 'static> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<T: Send + Sync + 'static> CacheStore<T> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            slots: DashMap::new(),
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn slot(&self, key: &QueryKey) -> Arc<Slot<T>> {
        Arc::clone(
            self.slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new(key.clone(), self.shutdown.clone())))
                .value(),
        )
    }

    fn existing(&self, key: &QueryKey) -> Option<Arc<Slot<T>>> {
        self.slots.get(key).map(|s| Arc::clone(s.value()))
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Subscribe to `key`, loading it with `fetcher` when needed.
    ///
    /// - no entry, or never loaded: start a request (status `loading`)
    /// - request already in flight: join it, `fetcher` is not called
    /// - settled and older than `stale_time`: return the cached entry and
    ///   refetch in the background
    ///
    /// The fetcher is remembered for later `invalidate` calls.
    pub fn subscribe<F, Fut>(&self, key: QueryKey, fetcher: F) -> Subscription<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let fetcher: Fetcher<T> = Arc::new(move || fetcher().boxed());
        let slot = self.slot(&key);
        let receiver = slot.attach(fetcher);

        let settled = receiver.borrow().status.is_settled();
        if !settled || !slot.is_fresh(&self.config) {
            slot.begin_fetch(FetchMode::Dedupe);
        }

        trace!(key = %key, subscribers = slot.subscriber_count(), "subscribed");
        Subscription::new(slot, receiver)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Mark `key` stale and, if anyone is still subscribed, refetch it with
    /// the last-known fetcher. A request already in flight is cancelled and
    /// replaced, since it may predate whatever made the data stale.
    ///
    /// Returns `true` if a request was issued.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let Some(slot) = self.existing(key) else {
            return false;
        };
        slot.mark_stale();
        if slot.subscriber_count() == 0 {
            debug!(key = %key, "invalidated with no subscribers, refetch deferred");
            return false;
        }
        slot.begin_fetch(FetchMode::Supersede)
    }

    /// Invalidate every key that starts with `prefix`. Returns how many
    /// requests were issued.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        let matching: Vec<QueryKey> = self
            .slots
            .iter()
            .filter(|s| s.key().starts_with(prefix))
            .map(|s| s.key().clone())
            .collect();
        matching.iter().filter(|k| self.invalidate(k)).count()
    }

    /// Overwrite `key` with `value` and mark it `success`, no request made.
    /// Current subscribers see the new value immediately.
    pub fn set_data(&self, key: QueryKey, value: T) {
        trace!(key = %key, "set_data");
        self.slot(&key).put(value);
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current entry for `key` without subscribing or fetching.
    pub fn get(&self, key: &QueryKey) -> Option<QueryEntry<T>> {
        self.existing(key).map(|s| s.entry())
    }

    /// Cached data for `key`, if its entry is in `success`.
    pub fn data(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.existing(key)
            .and_then(|s| s.state.borrow().data().map(Arc::clone))
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        self.slots.iter().map(|s| s.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Cancel every in-flight request. Entries still loading settle as
    /// `CoreError::Shutdown`; later subscriptions never start a request.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        for slot in &self.slots {
            slot.value().stop();
        }
        debug!(entries = self.slots.len(), "cache store shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl<T: Send + Sync + 'static> Drop for CacheStore<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
