use async_trait::async_trait;
use crate::types::{ArticleContent, ArticleStub};
use crate::Result;

#[async_trait]
pub trait SyndicationParser: Send + Sync {
    /// Fetch a feed and return its entries in document order
    async fn parse(&self, feed_url: &str) -> Result<Vec<ArticleStub>>;
}

#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    /// Fetch an article page and extract its text and metadata
    async fn extract(&self, url: &str) -> Result<ArticleContent>;
}
