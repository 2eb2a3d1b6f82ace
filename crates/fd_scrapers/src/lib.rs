pub mod extractor;
pub mod fetcher;
pub mod manager;
pub mod metadata;
pub mod syndication;

#[cfg(test)]
mod test_support;

pub use extractor::ReadabilityExtractor;
pub use fetcher::{FetchConfig, HttpFetcher};
pub use manager::{CacheConsistency, DigestManager};
pub use syndication::FeedParser;

use std::sync::Arc;

/// Feed parser and article extractor sharing one HTTP client.
pub fn http_capabilities(config: &FetchConfig) -> fd_core::Result<(Arc<FeedParser>, Arc<ReadabilityExtractor>)> {
    let fetcher = Arc::new(HttpFetcher::new(config)?);
    Ok((
        Arc::new(FeedParser::new(fetcher.clone())),
        Arc::new(ReadabilityExtractor::new(fetcher)),
    ))
}

pub mod prelude {
    pub use super::{CacheConsistency, DigestManager, FeedParser, ReadabilityExtractor};
    pub use fd_core::{ArticleContent, ArticleStub, Error, Result, Summary};
}
