use async_trait::async_trait;
use crate::types::{FeedDescriptor, Summary};
use crate::Result;

#[async_trait]
pub trait FeedRegistry: Send + Sync {
    /// Register a feed, failing with `Error::Conflict` if the url is taken
    async fn register(&self, name: &str, url: &str) -> Result<FeedDescriptor>;

    /// Resolve a feed id to its source url
    async fn lookup_url(&self, id: &str) -> Result<String>;

    /// Whether a (normalized) url is already registered
    async fn contains_url(&self, url: &str) -> Result<bool>;

    /// Every registered feed, in no particular order
    async fn list(&self) -> Result<Vec<FeedDescriptor>>;
}

#[async_trait]
pub trait SummaryCache: Send + Sync {
    /// Get the cached summary for an article url
    async fn get(&self, url: &str) -> Result<Option<Summary>>;

    /// Upsert keyed by `summary.url`, last writer wins
    async fn put(&self, summary: &Summary) -> Result<()>;

    /// Store only if nothing is cached for the url; returns whatever is stored afterwards
    async fn put_if_absent(&self, summary: &Summary) -> Result<Summary>;
}
