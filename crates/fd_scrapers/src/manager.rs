use fd_core::{
    normalize_url, ArticleExtractor, ArticleStub, Error, FeedDescriptor, FeedRegistry,
    InferenceModel, Result, Summary, SummaryCache, SyndicationParser,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// How a freshly computed summary is written to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheConsistency {
    /// Plain upsert. Concurrent misses all compute and the last write wins.
    #[default]
    BestEffort,
    /// Conditional insert. Concurrent misses may still compute, but every
    /// caller returns the first summary that reached the cache.
    ConditionalWrite,
}

impl FromStr for CacheConsistency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(Self::BestEffort),
            "conditional" | "conditional-write" => Ok(Self::ConditionalWrite),
            other => Err(Error::Config(format!("Unknown cache consistency: {}", other))),
        }
    }
}

impl fmt::Display for CacheConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestEffort => write!(f, "best-effort"),
            Self::ConditionalWrite => write!(f, "conditional"),
        }
    }
}

/// Request-level composition of registry, parser, extractor, model and cache.
#[derive(Clone)]
pub struct DigestManager {
    registry: Arc<dyn FeedRegistry>,
    cache: Arc<dyn SummaryCache>,
    parser: Arc<dyn SyndicationParser>,
    extractor: Arc<dyn ArticleExtractor>,
    inference: Arc<dyn InferenceModel>,
    consistency: CacheConsistency,
}

impl DigestManager {
    pub fn new(
        registry: Arc<dyn FeedRegistry>,
        cache: Arc<dyn SummaryCache>,
        parser: Arc<dyn SyndicationParser>,
        extractor: Arc<dyn ArticleExtractor>,
        inference: Arc<dyn InferenceModel>,
    ) -> Self {
        Self {
            registry,
            cache,
            parser,
            extractor,
            inference,
            consistency: CacheConsistency::default(),
        }
    }

    pub fn with_consistency(mut self, consistency: CacheConsistency) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn consistency(&self) -> CacheConsistency {
        self.consistency
    }

    pub fn model_name(&self) -> &str {
        self.inference.name()
    }

    pub async fn register_feed(&self, name: &str, url: &str) -> Result<FeedDescriptor> {
        let name = required("name", name)?;
        let url = required("url", url)?;
        let feed = self.registry.register(name, url).await?;
        info!("📡 Registered feed {} ({})", feed.name, feed.url);
        Ok(feed)
    }

    pub async fn list_feeds(&self) -> Result<Vec<FeedDescriptor>> {
        self.registry.list().await
    }

    /// Resolve the feed and parse its live document. Nothing is cached.
    pub async fn get_feed_articles(&self, feed_id: &str) -> Result<Vec<ArticleStub>> {
        let feed_id = required("feed id", feed_id)?;
        let url = self.registry.lookup_url(feed_id).await?;
        self.parser.parse(&url).await
    }

    /// Cached summary for an article, computing and storing it on a miss.
    pub async fn get_article_summary(&self, url: &str) -> Result<Summary> {
        let url = normalize_url(required("url", url)?)?;

        if let Some(cached) = self.cache.get(&url).await? {
            debug!("Cache hit for {}", url);
            return Ok(cached);
        }

        info!("🤖 Cache miss, summarizing {}", url);
        let summary = self.compute_summary(&url).await?;

        match self.consistency {
            CacheConsistency::BestEffort => {
                self.cache.put(&summary).await?;
                Ok(summary)
            }
            CacheConsistency::ConditionalWrite => {
                let stored = self.cache.put_if_absent(&summary).await?;
                if stored.id != summary.id {
                    debug!("Another request cached {} first", url);
                }
                Ok(stored)
            }
        }
    }

    /// Recompute the summary for a url and overwrite the cached entry.
    pub async fn summarize_url(&self, url: &str) -> Result<Summary> {
        let url = normalize_url(required("url", url)?)?;
        let summary = self.compute_summary(&url).await?;
        self.cache.put(&summary).await?;
        Ok(summary)
    }

    async fn compute_summary(&self, url: &str) -> Result<Summary> {
        let article = self.extractor.extract(url).await?;
        let text = self.inference.summarize_article(&article).await?;
        info!("✨ Summary generated for {} using {}", url, self.inference.name());
        Ok(Summary::new(url, text))
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("Missing required field: {}", field)));
    }
    Ok(value)
}
