//! Time-bounded memoisation shared between concurrent callers.

use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// A cached value and the instant it stops being served.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

/// Concurrent key/value cache whose entries expire after a fixed TTL.
///
/// Expired entries are evicted lazily when looked up; there is no background
/// sweep and no capacity bound. Each insert replaces the whole entry, so
/// concurrent readers observe either the old or the new value.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use rideshare_data::routing::TtlCache;
///
/// let cache = TtlCache::new(Duration::from_secs(300));
/// cache.insert("dur|a|b".to_owned(), 12_u32);
/// assert_eq!(cache.get("dur|a|b"), Some(12));
/// ```
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    ttl: Duration,
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live value for `key`, evicting it if it has expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_at(key, Instant::now())
    }

    /// [`TtlCache::get`] evaluated at `now`.
    pub fn get_at<Q>(&self, key: &Q, now: Instant) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let live = {
            let entry = self.entries.get(key)?;
            is_live(entry.expires_at, now).then(|| entry.value.clone())
        };
        if live.is_none() {
            self.entries
                .remove_if(key, |_, entry| !is_live(entry.expires_at, now));
        }
        live
    }

    /// Store `value` under `key` with a fresh expiry.
    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    /// [`TtlCache::insert`] evaluated at `now`.
    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        let expires_at = now.checked_add(self.ttl);
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Number of stored entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An entry without an expiry instant outlives any representable time.
fn is_live(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_none_or(|deadline| now < deadline)
}
