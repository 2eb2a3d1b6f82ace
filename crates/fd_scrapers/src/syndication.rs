use async_trait::async_trait;
use fd_core::{ArticleStub, Error, Result, SyndicationParser, UNKNOWN_AUTHOR};
use feed_rs::model::Entry;
use feed_rs::parser;
use std::sync::Arc;
use crate::fetcher::HttpFetcher;

/// RSS/Atom/JSON Feed parser backed by feed-rs.
#[derive(Clone)]
pub struct FeedParser {
    fetcher: Arc<HttpFetcher>,
}

impl FeedParser {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SyndicationParser for FeedParser {
    async fn parse(&self, feed_url: &str) -> Result<Vec<ArticleStub>> {
        let body = self.fetcher.fetch_bytes(feed_url).await?;
        let stubs = parse_document(&body)?;
        tracing::info!("📰 Parsed {} entries from {}", stubs.len(), feed_url);
        Ok(stubs)
    }
}

/// Parse a feed document into stubs, in document order.
///
/// Fails as a whole if any entry has no link or no publish date.
pub fn parse_document(body: &[u8]) -> Result<Vec<ArticleStub>> {
    // Entries without a native id get their first link instead of a hash.
    let parser = parser::Builder::new()
        .id_generator(|links, _title, _uri| {
            links.first().map(|link| link.href.clone()).unwrap_or_default()
        })
        .build();

    let feed = parser
        .parse(body)
        .map_err(|e| Error::Parse(format!("invalid feed document: {}", e)))?;

    feed.entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry_to_stub(index, entry))
        .collect()
}

fn entry_to_stub(index: usize, entry: Entry) -> Result<ArticleStub> {
    let url = entry
        .links
        .first()
        .map(|link| link.href.clone())
        .ok_or_else(|| Error::Parse(format!("feed entry {} has no link", index)))?;

    let publish_date = entry
        .published
        .ok_or_else(|| Error::Parse(format!("feed entry {} ({}) has no publish date", index, url)))?;

    let id = if entry.id.trim().is_empty() {
        url.clone()
    } else {
        entry.id
    };

    Ok(ArticleStub {
        id,
        title: entry
            .title
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default(),
        url,
        publish_date,
        author: entry
            .authors
            .into_iter()
            .map(|person| person.name.trim().to_string())
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        description: entry
            .summary
            .map(|s| s.content.trim().to_string())
            .unwrap_or_default(),
    })
}
