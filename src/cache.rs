//! A typed cache of backend responses, keyed by request.
//!
//! Every key is in one of the states of `CacheEntry`. A `Ready` entry turns `Stale` once it is
//! older than the cache's time-to-live, or immediately when it is invalidated. Stale and failed
//! entries are fetched again on the next access.

use crate::error::Res;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// The observable state of a cache key.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CacheEntry<V> {
    /// Never requested.
    Absent,
    /// A fetch was started and has not finished.
    Loading,
    /// Fetched within the time-to-live.
    Ready(V),
    /// Fetched, but too old or invalidated. Still readable.
    Stale(V),
    /// The last fetch failed.
    Error(String),
}

#[derive(Debug, Clone)]
enum Slot<V> {
    Loading,
    Ready { data: V, fetched_at: Instant },
    Stale(V),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct QueryCache<K, V> {
    ttl: Duration,
    slots: BTreeMap<K, Slot<V>>,
}

impl<K, V> QueryCache<K, V>
where
    K: Ord + Clone + Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: BTreeMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The state of `key` right now.
    pub fn entry(&self, key: &K) -> CacheEntry<&V> {
        self.entry_at(key, Instant::now())
    }

    fn entry_at(&self, key: &K, now: Instant) -> CacheEntry<&V> {
        match self.slots.get(key) {
            None => CacheEntry::Absent,
            Some(Slot::Loading) => CacheEntry::Loading,
            Some(Slot::Ready { data, fetched_at }) => {
                if now.saturating_duration_since(*fetched_at) < self.ttl {
                    CacheEntry::Ready(data)
                } else {
                    CacheEntry::Stale(data)
                }
            }
            Some(Slot::Stale(data)) => CacheEntry::Stale(data),
            Some(Slot::Error(reason)) => CacheEntry::Error(reason.clone()),
        }
    }

    /// Marks `key` stale so that the next access fetches it again.
    pub fn invalidate(&mut self, key: &K) {
        if let Some(slot) = self.slots.remove(key) {
            debug!("Invalidating {key:?}");
            if let Some(stale) = into_stale(slot) {
                self.slots.insert(key.clone(), stale);
            }
        }
    }

    /// Marks every key stale.
    pub fn invalidate_all(&mut self) {
        debug!("Invalidating {} cache entries", self.slots.len());
        self.slots = std::mem::take(&mut self.slots)
            .into_iter()
            .filter_map(|(k, slot)| into_stale(slot).map(|s| (k, s)))
            .collect();
    }

    /// Returns the cached value for `key` if it is `Ready`, otherwise awaits `fetch` and stores
    /// its outcome. A failed fetch is stored as `Error` and returned; it is not retried.
    pub async fn get_or_fetch<F, Fut>(&mut self, key: K, fetch: F) -> Res<V>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Res<V>>,
    {
        if let CacheEntry::Ready(data) = self.entry(&key) {
            trace!("Cache hit for {key:?}");
            return Ok(data.clone());
        }

        debug!("Fetching {key:?}");
        self.slots.insert(key.clone(), Slot::Loading);
        match fetch(key.clone()).await {
            Ok(data) => {
                self.slots.insert(
                    key,
                    Slot::Ready {
                        data: data.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(data)
            }
            Err(e) => {
                self.slots.insert(key, Slot::Error(format!("{e:#}")));
                Err(e)
            }
        }
    }
}

/// Ready data becomes stale. Loading and failed entries are dropped, which makes them `Absent`.
fn into_stale<V>(slot: Slot<V>) -> Option<Slot<V>> {
    match slot {
        Slot::Ready { data, .. } | Slot::Stale(data) => Some(Slot::Stale(data)),
        Slot::Loading | Slot::Error(_) => None,
    }
}
