use crate::error::{Error, Result};
use crate::tasbih::Dataset;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::Future;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

#[cfg(feature = "graphql")]
use async_graphql::SimpleObject;

/// Normalized category name: trimmed and lowercased.
#[derive(Hash, Eq, PartialEq, Clone, Debug, PartialOrd, Ord)]
pub struct CategoryKey(String);

impl CategoryKey {
    /// Normalize a raw category name, rejecting names that are empty after trimming.
    pub fn parse(category: &str) -> Result<Self> {
        let normalized = category.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(Error::invalid_argument("category is required"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the JSON file holding this category.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CategoryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A load every caller for the same category awaits together.
pub type PendingLoad = Shared<BoxFuture<'static, Result<Dataset>>>;

/// State of a category slot.
#[derive(Clone)]
pub enum CacheEntry {
    /// A fetch is in flight. `generation` identifies which load owns the slot.
    Pending { generation: u64, load: PendingLoad },
    Ready(Dataset),
}

impl CacheEntry {
    fn is_pending(&self, generation: u64) -> bool {
        matches!(self, Self::Pending { generation: g, .. } if *g == generation)
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { generation, .. } => f
                .debug_struct("Pending")
                .field("generation", generation)
                .finish(),
            Self::Ready(items) => f.debug_tuple("Ready").field(&items.len()).finish(),
        }
    }
}

enum Lookup {
    Hit(Dataset),
    Join(PendingLoad),
    Start {
        generation: u64,
        load: PendingLoad,
        notify: oneshot::Sender<Result<Dataset>>,
    },
}

/// In-memory category cache that also acts as a single-flight barrier:
/// at most one load per key is ever in flight.
///
/// Entries never expire; they go away only through [`CategoryCache::clear`]
/// or when their load fails.
#[derive(Default)]
pub struct CategoryCache {
    entries: Arc<DashMap<CategoryKey, CacheEntry>>,
    generation: AtomicU64,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the dataset for `key`, running `load_fn` only if nothing is
    /// cached or in flight for it.
    ///
    /// The existence check and the `Pending` install happen under the same
    /// shard lock with no suspension in between. The load itself runs on a
    /// spawned task, so it completes even if every caller goes away. Must be
    /// called from within a tokio runtime.
    pub async fn get_or_load<F, Fut>(&self, key: &CategoryKey, load_fn: F) -> Result<Dataset>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Dataset>> + Send + 'static,
    {
        let lookup = match self.entries.entry(key.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                CacheEntry::Ready(items) => Lookup::Hit(Arc::clone(items)),
                CacheEntry::Pending { load, .. } => Lookup::Join(load.clone()),
            },
            Entry::Vacant(entry) => {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let (notify, receiver) = oneshot::channel();
                let category = key.clone();
                let load = receiver
                    .map(move |received| {
                        received.unwrap_or_else(|_| {
                            Err(Error::fetch_failed(
                                category,
                                None,
                                "load task ended without a result",
                            ))
                        })
                    })
                    .boxed()
                    .shared();
                entry.insert(CacheEntry::Pending {
                    generation,
                    load: load.clone(),
                });
                Lookup::Start {
                    generation,
                    load,
                    notify,
                }
            }
        };

        match lookup {
            Lookup::Hit(items) => {
                log::debug!("Cache hit for category: {}", key);
                Ok(items)
            }
            Lookup::Join(load) => {
                log::debug!("Load already pending for category: {}", key);
                load.await
            }
            Lookup::Start {
                generation,
                load,
                notify,
            } => {
                log::debug!("Cache miss for category: {} (load #{})", key, generation);
                let entries = Arc::clone(&self.entries);
                let key = key.clone();
                let fetch = load_fn();
                tokio::spawn(async move {
                    let outcome = AssertUnwindSafe(fetch)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| Err(Error::fetch_failed(&key, None, "load panicked")));
                    settle(&entries, &key, generation, &outcome);
                    // Nobody left listening once the slot was cleared and every caller dropped.
                    let _ = notify.send(outcome);
                });
                load.await
            }
        }
    }

    /// Drop every entry. In-flight loads are not cancelled.
    pub fn clear(&self) {
        self.entries.clear();
        log::info!("Category cache cleared");
    }

    pub fn contains(&self, key: &CategoryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// The dataset for `key` if it is already loaded. Never triggers a fetch.
    pub fn get_ready(&self, key: &CategoryKey) -> Option<Dataset> {
        let entry = self.entries.get(key)?;
        match entry.value() {
            CacheEntry::Ready(items) => Some(Arc::clone(items)),
            CacheEntry::Pending { .. } => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for entry in self.entries.iter() {
            match entry.value() {
                CacheEntry::Pending { .. } => stats.pending_entries += 1,
                CacheEntry::Ready(items) => {
                    stats.ready_entries += 1;
                    stats.cached_items += items.len();
                }
            }
        }
        stats
    }
}

/// Record the outcome of load `generation` for `key`.
///
/// Only the load that owns the slot may replace or remove it. A slot emptied
/// by `clear` while the load ran is refilled on success and left empty on failure.
fn settle(
    entries: &DashMap<CategoryKey, CacheEntry>,
    key: &CategoryKey,
    generation: u64,
    outcome: &Result<Dataset>,
) {
    match entries.entry(key.clone()) {
        Entry::Occupied(mut entry) => {
            if !entry.get().is_pending(generation) {
                log::debug!(
                    "Load #{} for category {} superseded, leaving slot untouched",
                    generation,
                    key
                );
                return;
            }
            match outcome {
                Ok(items) => {
                    log::debug!("Stored {} items for category: {}", items.len(), key);
                    entry.insert(CacheEntry::Ready(Arc::clone(items)));
                }
                Err(err) => {
                    log::debug!("Evicting category {} after failed load: {}", key, err);
                    entry.remove();
                }
            }
        }
        Entry::Vacant(entry) => {
            if let Ok(items) = outcome {
                log::debug!("Orphaned load #{} repopulated category: {}", generation, key);
                entry.insert(CacheEntry::Ready(Arc::clone(items)));
            }
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(SimpleObject))]
pub struct CacheStats {
    pub pending_entries: usize,
    pub ready_entries: usize,
    pub cached_items: usize,
}

/// Thread-safe wrapper for the cache
pub type SharedCategoryCache = Arc<CategoryCache>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasbih::TasbihItem;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn dataset(ids: &[&str]) -> Dataset {
        Arc::new(ids.iter().map(|id| TasbihItem::new(*id)).collect())
    }

    #[test]
    fn test_category_key_normalization() {
        let key1 = CategoryKey::parse("Post-Prayer ").unwrap();
        let key2 = CategoryKey::parse("post-prayer").unwrap();

        assert_eq!(key1, key2);
        assert_eq!(key1.as_str(), "post-prayer");
        assert_eq!(key1.file_name(), "post-prayer.json");
    }

    #[test]
    fn test_category_key_rejects_blank() {
        for raw in ["", "   ", "\t\n"] {
            let err = CategoryKey::parse(raw).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
        }
    }

    #[tokio::test]
    async fn test_concurrent_loads_run_once() {
        let cache = Arc::new(CategoryCache::new());
        let execution_count = Arc::new(AtomicUsize::new(0));
        let key = CategoryKey::parse("morning").unwrap();

        let mut handles = vec![];
        for _ in 0..5 {
            let cache = cache.clone();
            let key = key.clone();
            let execution_count = execution_count.clone();

            handles.push(tokio::spawn(async move {
                cache
                    .get_or_load(&key, || async move {
                        execution_count.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(dataset(&["1", "2"]))
                    })
                    .await
            }));
        }

        let mut results = vec![];
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(execution_count.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|items| Arc::ptr_eq(items, &results[0])));
        assert_eq!(cache.stats().ready_entries, 1);
    }

    #[tokio::test]
    async fn test_different_keys_load_independently() {
        let cache = CategoryCache::new();
        let execution_count = Arc::new(AtomicUsize::new(0));
        let key1 = CategoryKey::parse("morning").unwrap();
        let key2 = CategoryKey::parse("evening").unwrap();

        let count1 = execution_count.clone();
        let count2 = execution_count.clone();
        let (first, second) = futures::join!(
            cache.get_or_load(&key1, || async move {
                count1.fetch_add(1, Ordering::SeqCst);
                Ok(dataset(&["1"]))
            }),
            cache.get_or_load(&key2, || async move {
                count2.fetch_add(1, Ordering::SeqCst);
                Ok(dataset(&["2"]))
            }),
        );

        assert_eq!(first.unwrap()[0].id(), "1");
        assert_eq!(second.unwrap()[0].id(), "2");
        assert_eq!(execution_count.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_evicted() {
        let cache = CategoryCache::new();
        let key = CategoryKey::parse("morning").unwrap();

        let err = cache
            .get_or_load(&key, || async {
                Err(Error::fetch_failed("morning", Some(503), "unavailable"))
            })
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(!cache.contains(&key));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_ready_entry_skips_loader() {
        let cache = CategoryCache::new();
        let key = CategoryKey::parse("morning").unwrap();

        let first = cache
            .get_or_load(&key, || async { Ok(dataset(&["1"])) })
            .await
            .unwrap();
        let second = cache
            .get_or_load(&key, || async {
                Err(Error::fetch_failed("morning", None, "must not run"))
            })
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.get_ready(&key).is_some());
    }

    #[test]
    fn test_settle_ignores_other_generations() {
        let entries = DashMap::new();
        let key = CategoryKey::parse("morning").unwrap();
        let newer = dataset(&["new"]);
        entries.insert(key.clone(), CacheEntry::Ready(newer.clone()));

        settle(&entries, &key, 0, &Ok(dataset(&["old"])));
        settle(&entries, &key, 0, &Err(Error::fetch_failed("morning", None, "x")));

        match entries.get(&key).unwrap().value() {
            CacheEntry::Ready(items) => assert!(Arc::ptr_eq(items, &newer)),
            other => panic!("unexpected entry: {:?}", other),
        };
    }

    #[tokio::test]
    async fn test_panicking_load_is_evicted() {
        let cache = CategoryCache::new();
        let execution_count = Arc::new(AtomicUsize::new(0));
        let key = CategoryKey::parse("morning").unwrap();

        let count = execution_count.clone();
        let err = cache
            .get_or_load(&key, || async move {
                if count.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("source blew up");
                }
                Ok(dataset(&["unreachable"]))
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::FetchFailed);
        assert!(!cache.contains(&key));
        assert_eq!(cache.stats().pending_entries, 0);

        let count = execution_count.clone();
        let items = cache
            .get_or_load(&key, || async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(dataset(&["1"]))
            })
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(execution_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_settle_vacant_slot() {
        let entries = DashMap::new();
        let key = CategoryKey::parse("morning").unwrap();

        settle(&entries, &key, 3, &Err(Error::fetch_failed("morning", None, "x")));
        assert!(entries.is_empty());

        settle(&entries, &key, 3, &Ok(dataset(&["1"])));
        assert!(matches!(
            entries.get(&key).unwrap().value(),
            CacheEntry::Ready(_)
        ));
    }
}
