//! TTL cache for fetched fee quotes
//!
//! An explicit value owned by whoever performs the fetches. Entries are
//! independently keyed; refetching a key overwrites it (last write wins).

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bridge_core::BridgeConfig;

use crate::key::QuoteKey;

/// Time source for staleness checks
pub trait Clock {
    /// Time elapsed since the Unix epoch
    fn now(&self) -> Duration;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Duration) -> Self {
        let clock = Self::default();
        clock.set(start);
        clock
    }

    pub fn set(&self, now: Duration) {
        self.millis.store(now.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// A cached value and when it was fetched
#[derive(Debug, Clone)]
pub struct Timestamped<T> {
    pub value: T,
    pub fetched_at: Duration,
}

/// Quote cache with a fixed TTL
#[derive(Debug, Clone)]
pub struct QuoteCache<T, C = SystemClock> {
    entries: HashMap<QuoteKey, Timestamped<T>>,
    ttl: Duration,
    clock: C,
}

impl<T: Clone> QuoteCache<T, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(Duration::from_secs(config.quote_ttl_secs))
    }
}

impl<T: Clone, C: Clock> QuoteCache<T, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &Timestamped<T>) -> bool {
        self.clock.now().saturating_sub(entry.fetched_at) < self.ttl
    }

    /// The cached value, if present and `now - fetched_at < ttl`
    pub fn get(&self, key: &QuoteKey) -> Option<&T> {
        self.entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: QuoteKey, value: T) {
        let fetched_at = self.clock.now();
        self.entries.insert(key, Timestamped { value, fetched_at });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Return the fresh cached value or await `fetch` and store its result.
    ///
    /// A failed fetch leaves the cache untouched.
    pub async fn get_or_fetch<F, Fut, E>(&mut self, key: QuoteKey, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(&key) {
            tracing::debug!(key = %key, "Quote cache hit");
            return Ok(value.clone());
        }

        tracing::debug!(key = %key, "Quote cache miss, fetching");
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}
