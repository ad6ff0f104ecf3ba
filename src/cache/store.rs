//! Cache Store Module
//!
//! Per-user cache of aggregation results with TTL expiry, LRU bound and
//! single-flight refreshes.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::error::{Result, ServiceError};
use crate::models::AggregationResult;

type RefreshOutcome = Result<Arc<AggregationResult>>;

/// Receiving end of a running refresh, cloneable so every concurrent caller
/// for the key awaits the same outcome.
type ComputationChannel = Shared<oneshot::Receiver<RefreshOutcome>>;

/// What a missing caller does: join the running refresh or lead a new one.
enum Flight {
    Join(ComputationChannel),
    Lead(ComputationChannel, oneshot::Sender<RefreshOutcome>),
}

fn panicked(key: &str) -> ServiceError {
    ServiceError::Upstream(format!("refresh of {} panicked", key))
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    /// Refreshes currently running, at most one per key
    in_flight: HashMap<String, ComputationChannel>,
    stats: CacheStats,
}

impl StoreState {
    /// Inserts or replaces an entry, evicting least recently used entries
    /// when a new key would exceed `max_entries` (0 = unbounded).
    fn insert(&mut self, entry: CacheEntry, max_entries: usize) {
        let key = entry.key.clone();

        if max_entries > 0 && !self.entries.contains_key(&key) {
            while self.entries.len() >= max_entries {
                let Some(evicted) = self.lru.evict_oldest() else {
                    break;
                };
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!("Evicted least recently used entry for {}", evicted);
            }
        }

        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
    }
}

// == Cache Store ==
/// Per-user cache of aggregation results.
///
/// Clones share the same underlying state. The mutex guards bookkeeping only
/// and is never held across a computation: refreshes run on their own task
/// and take the lock again just to publish their outcome.
#[derive(Clone)]
pub struct CacheStore {
    state: Arc<Mutex<StoreState>>,
    ttl: Duration,
    max_entries: usize,
    serve_stale_on_error: bool,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .field("serve_stale_on_error", &self.serve_stale_on_error)
            .field("entries", &self.len())
            .finish()
    }
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store whose entries stay fresh for `ttl`.
    ///
    /// # Arguments
    /// * `ttl` - Freshness duration of every stored entry
    /// * `max_entries` - Maximum number of users kept, 0 for no bound
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            ttl,
            max_entries,
            serve_stale_on_error: false,
        }
    }

    /// When enabled, a failed refresh is answered with the previous (stale)
    /// value for the key if one exists, instead of the error.
    pub fn with_stale_fallback(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // Critical sections never panic midway, so a poisoned state is intact
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Get ==
    /// Returns a snapshot of the entry for `key`, fresh or stale.
    ///
    /// Pure read: does not touch recency or statistics.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.lock().entries.get(key).cloned()
    }

    // == Refresh ==
    /// Returns the fresh value for `key`, computing it if needed.
    ///
    /// A fresh entry is returned without calling `compute`. Otherwise the
    /// computation for `key` is started unless one is already running, in
    /// which case the caller joins it; either way every concurrent caller
    /// receives the same value or the same error.
    ///
    /// `compute` is called with the store unlocked, after this call has been
    /// registered as the key's in-flight refresh. The computation runs on a
    /// spawned task: dropping the returned future does not cancel it, and its
    /// result still lands in the cache. On success the entry expires at
    /// `now + ttl`. On failure any previous entry is left untouched.
    pub async fn refresh<F, Fut>(&self, key: &str, now: Instant, compute: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AggregationResult>> + Send + 'static,
    {
        let flight = {
            let mut guard = self.lock();
            let state = &mut *guard;

            if let Some(entry) = state.entries.get(key).filter(|entry| entry.is_fresh(now)) {
                let value = Arc::clone(&entry.value);
                debug!(
                    "Cache hit for {} (cached at {}, fresh for {}s)",
                    key,
                    entry.created_at.to_rfc3339(),
                    entry.ttl_remaining(now).as_secs()
                );
                state.stats.record_hit();
                state.lru.touch(key);
                return Ok(value);
            }

            state.stats.record_miss();
            match state.in_flight.get(key) {
                Some(channel) => {
                    state.stats.record_coalesced();
                    debug!("Joining in-flight refresh for {}", key);
                    Flight::Join(channel.clone())
                }
                None => {
                    state.stats.record_refresh();
                    info!("Refreshing {}", key);
                    let (sender, receiver) = oneshot::channel();
                    let channel = receiver.shared();
                    state.in_flight.insert(key.to_string(), channel.clone());
                    Flight::Lead(channel, sender)
                }
            }
        };

        let channel = match flight {
            Flight::Join(channel) => channel,
            Flight::Lead(channel, sender) => {
                self.spawn_refresh(key.to_string(), now, compute, sender);
                channel
            }
        };

        channel.await.unwrap_or_else(|_| {
            Err(ServiceError::Upstream(format!(
                "refresh of {} ended without a result",
                key
            )))
        })
    }

    /// Builds the computation and runs it on its own task, publishing the
    /// outcome through `sender`.
    fn spawn_refresh<F, Fut>(
        &self,
        key: String,
        now: Instant,
        compute: F,
        sender: oneshot::Sender<RefreshOutcome>,
    ) where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AggregationResult>> + Send + 'static,
    {
        let computation = match panic::catch_unwind(AssertUnwindSafe(compute)) {
            Ok(computation) => computation,
            Err(_) => {
                let outcome = self.complete_refresh(&key, now, Err(panicked(&key)));
                let _ = sender.send(outcome);
                return;
            }
        };

        let store = self.clone();
        tokio::spawn(async move {
            let result = AssertUnwindSafe(computation)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(panicked(&key)));
            let outcome = store.complete_refresh(&key, now, result);
            // All waiters may have gone away; the cache is updated regardless
            let _ = sender.send(outcome);
        });
    }

    /// Clears the in-flight marker for `key` and publishes the result. Only a
    /// success is stored; a failure may fall back to the previous value.
    fn complete_refresh(
        &self,
        key: &str,
        now: Instant,
        result: Result<AggregationResult>,
    ) -> RefreshOutcome {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.in_flight.remove(key);

        match result {
            Ok(value) => {
                let value = Arc::new(value);
                state.insert(
                    CacheEntry::new(key, Arc::clone(&value), now, self.ttl),
                    self.max_entries,
                );
                info!(
                    "Refreshed {}: {} repositories, {} languages",
                    key,
                    value.repositories.len(),
                    value.language_shares.len()
                );
                Ok(value)
            }
            Err(err) => {
                state.stats.record_failed_refresh();
                if self.serve_stale_on_error {
                    if let Some(previous) = state.entries.get(key) {
                        state.stats.record_stale_served();
                        warn!("Refresh of {} failed, serving stale value: {}", key, err);
                        return Ok(Arc::clone(&previous.value));
                    }
                }
                warn!("Refresh of {} failed: {}", key, err);
                Err(err)
            }
        }
    }

    // == Evict ==
    /// Removes the entry for `key`. Returns false if nothing was cached.
    pub fn evict(&self, key: &str) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.entries.remove(key).is_some() {
            state.lru.remove(key);
            state.stats.record_eviction();
            true
        } else {
            false
        }
    }

    // == Purge Stale ==
    /// Removes every entry that is stale at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn purge_stale(&self, now: Instant) -> usize {
        let mut guard = self.lock();
        let state = &mut *guard;

        let stale: Vec<String> = state
            .entries
            .values()
            .filter(|entry| entry.is_stale(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &stale {
            state.entries.remove(key);
            state.lru.remove(key);
        }
        stale.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let mut stats = state.stats.clone();
        stats.total_entries = state.entries.len();
        stats.in_flight = state.in_flight.len();
        stats
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}
