pub mod cache;
pub mod client;
mod config;
mod error;
mod tasbih;


use cache::{CategoryCache, CategoryKey, SharedCategoryCache};
pub use client::jsdelivr::JsDelivr;
pub use client::DatasetSource;
pub use config::KitConfig;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
use std::collections::HashSet;
use std::sync::Arc;
pub use tasbih::{Dataset, TasbihItem};

// Re-export cache types
pub use cache::CacheStats;

/// Cached access to the tasbihkit category datasets.
///
/// Clones share the same source and cache.
#[derive(Clone)]
pub struct TasbihKit {
    source: Arc<dyn DatasetSource>,
    cache: SharedCategoryCache,
}

impl Default for TasbihKit {
    fn default() -> Self {
        Self::new()
    }
}

impl TasbihKit {
    /// Client for the public jsDelivr mirror with an empty cache.
    pub fn new() -> Self {
        Self::with_source(JsDelivr::new())
    }

    pub fn with_config(config: KitConfig) -> Result<Self> {
        Ok(Self::with_source(JsDelivr::with_config(&config)?))
    }

    /// Configuration from `TASBIHKIT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::with_config(KitConfig::from_env()?)
    }

    pub fn with_source(source: impl DatasetSource + 'static) -> Self {
        Self::with_cache(source, Arc::new(CategoryCache::new()))
    }

    /// Use an existing cache, possibly shared with other clients.
    pub fn with_cache(source: impl DatasetSource + 'static, cache: SharedCategoryCache) -> Self {
        Self {
            source: Arc::new(source),
            cache,
        }
    }

    pub fn cache(&self) -> &SharedCategoryCache {
        &self.cache
    }

    /// Load the full dataset for a category.
    ///
    /// Concurrent calls for the same category share a single fetch, and a
    /// successful load is served from memory until [`TasbihKit::clear_cache`].
    /// A failed load is not remembered.
    pub async fn load_all(&self, category: &str) -> Result<Dataset> {
        let key = CategoryKey::parse(category)?;
        let source = Arc::clone(&self.source);
        let fetch_key = key.clone();

        self.cache
            .get_or_load(&key, move || async move {
                let body = source.fetch(&fetch_key).await?;
                tasbih::parse_dataset(&fetch_key, &body)
            })
            .await
    }

    /// First item of `category` whose id equals `id` (trimmed, case-sensitive).
    ///
    /// Only an empty `id` is rejected up front; a blank one is looked up and misses.
    pub async fn search_by_id(&self, category: &str, id: impl ToString) -> Result<TasbihItem> {
        let id = id.to_string();
        if id.is_empty() {
            return Err(Error::invalid_argument("tasbih ID is required"));
        }
        let id = id.trim();

        let items = self.load_all(category).await?;
        items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                category: category.trim().to_lowercase(),
                id: id.to_string(),
            })
    }

    /// Items whose id is one of `ids`, in dataset order and without duplicates.
    ///
    /// An empty `ids` returns nothing without touching the network.
    pub async fn search_by_ids<I>(&self, category: &str, ids: I) -> Result<Vec<TasbihItem>>
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let items = self.load_all(category).await?;
        let wanted: HashSet<&str> = ids.iter().map(|id| id.trim()).collect();

        Ok(items
            .iter()
            .filter(|item| wanted.contains(item.id().as_str()))
            .cloned()
            .collect())
    }

    /// Items whose label contains `keyword`, ignoring case.
    ///
    /// An empty keyword returns nothing without touching the network.
    pub async fn search_by_label(&self, category: &str, keyword: &str) -> Result<Vec<TasbihItem>> {
        if keyword.is_empty() {
            return Ok(vec![]);
        }

        let items = self.load_all(category).await?;
        let term = keyword.to_lowercase();

        Ok(items
            .iter()
            .filter(|item| item.label_contains(&term))
            .cloned()
            .collect())
    }

    /// Items whose translation contains `translation`, ignoring case.
    pub async fn search_by_translation(
        &self,
        category: &str,
        translation: &str,
    ) -> Result<Vec<TasbihItem>> {
        if translation.is_empty() {
            return Ok(vec![]);
        }

        let items = self.load_all(category).await?;
        let term = translation.to_lowercase();

        Ok(items
            .iter()
            .filter(|item| item.translation_contains(&term))
            .cloned()
            .collect())
    }

    /// Forget every loaded and pending category. Fetches already in flight keep running.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
