use async_trait::async_trait;
use fd_core::{normalize_url, Error, FeedDescriptor, FeedRegistry, Result, Summary, SummaryCache};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::StorageBackend;

#[derive(Default)]
struct FeedTable {
    feeds: HashMap<String, FeedDescriptor>,
    // normalized url -> feed id
    by_url: HashMap<String, String>,
}

impl FeedTable {
    fn register(&mut self, name: &str, url: &str) -> Result<FeedDescriptor> {
        let url = normalize_url(url)?;
        if self.by_url.contains_key(&url) {
            return Err(Error::Conflict("Feed with this URL already exists".to_string()));
        }
        let feed = FeedDescriptor::new(name, url.clone());
        self.by_url.insert(url, feed.id.clone());
        self.feeds.insert(feed.id.clone(), feed.clone());
        Ok(feed)
    }
}

/// Process-local registry and summary cache.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    feeds: Arc<RwLock<FeedTable>>,
    summaries: Arc<RwLock<HashMap<String, Summary>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl FeedRegistry for MemoryStorage {
    async fn register(&self, name: &str, url: &str) -> Result<FeedDescriptor> {
        let mut table = self.feeds.write().await;
        table.register(name, url)
    }

    async fn lookup_url(&self, id: &str) -> Result<String> {
        let table = self.feeds.read().await;
        table
            .feeds
            .get(id)
            .map(|feed| feed.url.clone())
            .ok_or_else(|| Error::NotFound(format!("Feed not found: {}", id)))
    }

    async fn contains_url(&self, url: &str) -> Result<bool> {
        let url = normalize_url(url)?;
        let table = self.feeds.read().await;
        Ok(table.by_url.contains_key(&url))
    }

    async fn list(&self) -> Result<Vec<FeedDescriptor>> {
        let table = self.feeds.read().await;
        Ok(table.feeds.values().cloned().collect())
    }
}

#[async_trait]
impl SummaryCache for MemoryStorage {
    async fn get(&self, url: &str) -> Result<Option<Summary>> {
        let summaries = self.summaries.read().await;
        Ok(summaries.get(url).cloned())
    }

    async fn put(&self, summary: &Summary) -> Result<()> {
        let mut summaries = self.summaries.write().await;
        summaries.insert(summary.url.clone(), summary.clone());
        Ok(())
    }

    async fn put_if_absent(&self, summary: &Summary) -> Result<Summary> {
        let mut summaries = self.summaries.write().await;
        Ok(summaries
            .entry(summary.url.clone())
            .or_insert_with(|| summary.clone())
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_register_and_lookup() {
        let storage = MemoryStorage::new();
        let feed = storage.register("Example", "https://ex.com/feed").await.unwrap();
        assert_eq!(feed.name, "Example");
        assert_eq!(storage.lookup_url(&feed.id).await.unwrap(), "https://ex.com/feed");
        assert!(storage.contains_url("https://ex.com/feed").await.unwrap());
        assert!(!storage.contains_url("https://other.com/feed").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_url_conflicts_regardless_of_name() {
        let storage = MemoryStorage::new();
        storage.register("Example", "https://ex.com/feed").await.unwrap();

        let err = storage.register("Another name", "https://ex.com/feed").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // same url modulo fragment and host case
        let err = storage.register("Third", "https://EX.com/feed#latest").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_returns_every_feed() {
        let storage = MemoryStorage::new();
        let mut expected = HashSet::new();
        for i in 0..25 {
            let feed = storage
                .register(&format!("Feed {}", i), &format!("https://ex.com/{}/feed", i))
                .await
                .unwrap();
            expected.insert(feed);
        }
        let listed: HashSet<_> = storage.list().await.unwrap().into_iter().collect();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn test_lookup_unknown_id() {
        let storage = MemoryStorage::new();
        let err = storage.lookup_url("missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cache_put_overwrites() {
        let storage = MemoryStorage::new();
        assert!(storage.get("https://ex.com/a").await.unwrap().is_none());

        let first = Summary::new("https://ex.com/a", "first");
        let second = Summary::new("https://ex.com/a", "second");
        storage.put(&first).await.unwrap();
        storage.put(&second).await.unwrap();

        assert_eq!(storage.get("https://ex.com/a").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_cache_put_if_absent_keeps_first() {
        let storage = MemoryStorage::new();
        let first = Summary::new("https://ex.com/a", "first");
        let second = Summary::new("https://ex.com/a", "second");

        assert_eq!(storage.put_if_absent(&first).await.unwrap(), first);
        assert_eq!(storage.put_if_absent(&second).await.unwrap(), first);
        assert_eq!(storage.get("https://ex.com/a").await.unwrap(), Some(first));
    }
}
