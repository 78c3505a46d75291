//! Read-through query cache with explicit invalidation.
//!
//! Design goals:
//! - Readers ask for a [`QueryKey`] and get `Arc<T>`; a miss runs the
//!   supplied fetch and seeds the cache, so repeated reads of the same key
//!   cost one fetch.
//! - Mutations never write through the cache directly; they publish an
//!   [`Invalidation`] on the [`InvalidationBus`] and the next read refetches.
//! - Failed fetches cache nothing; the next read retries.
//!
//! Implementation details:
//! - Key = (resource name, optional record id). List views use the bare
//!   resource key, single records carry the id.
//! - Value = `Arc<T>` stored as `Box<dyn Any + Send + Sync>` (downcast on
//!   read). A type mismatch under a key is treated as a miss and logged.
//! - The bus holds `Weak` references to caches; dead subscribers are pruned
//!   on publish, so dropping a cache unsubscribes it.
//! - Delivery is synchronous: when `publish` returns, every live cache has
//!   already applied the event.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::RwLock;

/// Cache key naming either a whole resource collection or one record in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: &'static str,
    id: Option<String>,
}

impl QueryKey {
    /// Key for the list view of `resource`.
    pub fn list(resource: &'static str) -> Self {
        Self { resource, id: None }
    }

    /// Key for a single record of `resource`.
    pub fn item(resource: &'static str, id: impl ToString) -> Self {
        Self {
            resource,
            id: Some(id.to_string()),
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            None => f.write_str(self.resource),
            Some(id) => write!(f, "{}/{}", self.resource, id),
        }
    }
}

/// Cache event published after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Drop one key.
    Key(QueryKey),
    /// Drop every key of a resource, list and items alike.
    Resource(&'static str),
}

type Boxed = Box<dyn Any + Send + Sync>;

/// Concurrent map from [`QueryKey`] to one cached `Arc<T>` per key.
pub struct QueryCache {
    entries: DashMap<QueryKey, Boxed>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Cached value under `key`, if present and of the expected type.
    pub fn get<T>(&self, key: &QueryKey) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let entry = self.entries.get(key)?;
        match entry.value().downcast_ref::<Arc<T>>() {
            Some(value) => Some(value.clone()),
            None => {
                tracing::warn!(key = %key, "cached entry has a different type; treating as miss");
                None
            }
        }
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn seed<T>(&self, key: QueryKey, value: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        self.entries.insert(key, Box::new(value));
    }

    /// Return the cached value or run `fetch`, seed the result, and return
    /// it. A failed fetch leaves the cache untouched so the next call
    /// retries.
    ///
    /// No lock is held across the fetch; if two tasks race on the same cold
    /// key both fetch and the later insert wins.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(&key) {
            tracing::trace!(key = %key, "cache hit");
            return Ok(hit);
        }
        tracing::trace!(key = %key, "cache miss, fetching");
        let value = Arc::new(fetch().await?);
        self.seed(key, value.clone());
        Ok(value)
    }

    /// Drop one key.
    pub fn invalidate(&self, key: &QueryKey) {
        if self.entries.remove(key).is_some() {
            tracing::trace!(key = %key, "invalidated");
        }
    }

    /// Drop every key of `resource`.
    pub fn invalidate_resource(&self, resource: &str) {
        self.entries.retain(|key, _| key.resource != resource);
        tracing::trace!(resource, "resource invalidated");
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn apply(&self, event: &Invalidation) {
        match event {
            Invalidation::Key(key) => self.invalidate(key),
            Invalidation::Resource(resource) => self.invalidate_resource(resource),
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Fan-out point for [`Invalidation`] events.
///
/// Mutation paths publish here instead of reaching into caches; any number
/// of caches subscribe. Subscriptions are weak, so a dropped cache falls
/// off the list on the next publish.
pub struct InvalidationBus {
    sinks: RwLock<Vec<Weak<QueryCache>>>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, cache: &Arc<QueryCache>) {
        self.sinks.write().push(Arc::downgrade(cache));
    }

    /// Apply `event` to every live subscriber, pruning dead ones.
    pub fn publish(&self, event: &Invalidation) {
        let mut sinks = self.sinks.write();
        sinks.retain(|weak| match weak.upgrade() {
            Some(cache) => {
                cache.apply(event);
                true
            }
            None => false,
        });
        tracing::debug!(?event, sinks = sinks.len(), "invalidation published");
    }

    /// Live subscriber count as of the last publish.
    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn seed_and_get_share_the_same_allocation() {
        let cache = QueryCache::new();
        let value = Arc::new(vec![1i64, 2, 3]);
        cache.seed(QueryKey::list("nums"), value.clone());

        let got = cache.get::<Vec<i64>>(&QueryKey::list("nums")).unwrap();
        assert_eq!(Arc::as_ptr(&value), Arc::as_ptr(&got));
    }

    #[test]
    fn type_mismatch_is_a_miss_without_eviction() {
        let cache = QueryCache::new();
        cache.seed(QueryKey::list("nums"), Arc::new(vec![1i64]));

        assert!(cache.get::<String>(&QueryKey::list("nums")).is_none());
        // The entry survives for correctly-typed readers.
        assert!(cache.get::<Vec<i64>>(&QueryKey::list("nums")).is_some());
    }

    #[tokio::test]
    async fn repeated_reads_fetch_once() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = cache
                .get_or_fetch(QueryKey::list("nums"), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, String>(vec![1i64, 2, 3]) }
                })
                .await
                .unwrap();
            assert_eq!(*got, vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_caches_nothing() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result: Result<Arc<Vec<i64>>, String> = cache
                .get_or_fetch(QueryKey::list("nums"), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("boom".to_string()) }
                })
                .await;
            assert_eq!(result.unwrap_err(), "boom");
        }
        // Every read retried; nothing was cached.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidating_one_key_leaves_the_rest() {
        let cache = QueryCache::new();
        cache.seed(QueryKey::list("nums"), Arc::new(vec![1i64]));
        cache.seed(QueryKey::item("nums", 7), Arc::new(7i64));

        cache.invalidate(&QueryKey::item("nums", 7));
        assert!(cache.get::<i64>(&QueryKey::item("nums", 7)).is_none());
        assert!(cache.get::<Vec<i64>>(&QueryKey::list("nums")).is_some());
    }

    #[test]
    fn resource_invalidation_clears_list_and_items() {
        let cache = QueryCache::new();
        cache.seed(QueryKey::list("nums"), Arc::new(vec![1i64]));
        cache.seed(QueryKey::item("nums", 7), Arc::new(7i64));
        cache.seed(QueryKey::list("words"), Arc::new(vec!["a".to_string()]));

        cache.invalidate_resource("nums");
        assert!(cache.get::<Vec<i64>>(&QueryKey::list("nums")).is_none());
        assert!(cache.get::<i64>(&QueryKey::item("nums", 7)).is_none());
        assert!(cache.get::<Vec<String>>(&QueryKey::list("words")).is_some());
    }

    #[test]
    fn bus_reaches_every_live_cache_and_prunes_dead_ones() {
        let bus = InvalidationBus::new();
        let a = Arc::new(QueryCache::new());
        let b = Arc::new(QueryCache::new());
        bus.subscribe(&a);
        bus.subscribe(&b);

        a.seed(QueryKey::list("nums"), Arc::new(vec![1i64]));
        b.seed(QueryKey::list("nums"), Arc::new(vec![2i64]));

        bus.publish(&Invalidation::Resource("nums"));
        assert!(a.is_empty());
        assert!(b.is_empty());

        drop(b);
        bus.publish(&Invalidation::Key(QueryKey::list("nums")));
        assert_eq!(bus.sink_count(), 1);
    }

    #[test]
    fn key_event_only_touches_that_key() {
        let bus = InvalidationBus::new();
        let cache = Arc::new(QueryCache::new());
        bus.subscribe(&cache);

        cache.seed(QueryKey::list("nums"), Arc::new(vec![1i64]));
        cache.seed(QueryKey::item("nums", 7), Arc::new(7i64));

        bus.publish(&Invalidation::Key(QueryKey::list("nums")));
        assert!(cache.get::<Vec<i64>>(&QueryKey::list("nums")).is_none());
        assert!(cache.get::<i64>(&QueryKey::item("nums", 7)).is_some());
    }
}
