use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::{Error, Result};

/// A registered syndication source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedDescriptor {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl FeedDescriptor {
    /// Builds a descriptor with a freshly generated id.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            url: url.into(),
        }
    }
}

pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Per-entry metadata read from a feed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleStub {
    pub id: String,
    pub title: String,
    pub url: String,
    pub publish_date: DateTime<Utc>,
    pub author: String,
    pub description: String,
}

/// Full text and metadata extracted from an article page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleContent {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    pub author: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
}

/// A summary as stored in the cache, keyed by `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub url: String,
    pub summary: String,
}

impl Summary {
    pub fn new(url: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            summary: summary.into(),
        }
    }
}

/// Canonical form used for url identity: parsed, fragment dropped.
///
/// Only http and https urls are accepted.
pub fn normalize_url(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(Error::Validation(format!(
                "unsupported URL scheme: {}",
                scheme
            )))
        }
    }
    if url.host().is_none() {
        return Err(Error::Validation("URL has no host".to_string()));
    }
    url.set_fragment(None);
    Ok(url.to_string())
}
