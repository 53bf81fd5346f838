pub mod jsdelivr;

use crate::cache::CategoryKey;
use crate::error::Result;
use async_trait::async_trait;

/// Where category files come from.
///
/// Implementations return the raw body of `{category}.json`; decoding is done
/// by the caller so every source shares the same parse-failure handling.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self, category: &CategoryKey) -> Result<String>;
}
