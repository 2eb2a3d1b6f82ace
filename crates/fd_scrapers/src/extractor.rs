use async_trait::async_trait;
use fd_core::{ArticleContent, ArticleExtractor, Result};
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;
use crate::fetcher::HttpFetcher;
use crate::metadata::{self, clean};

/// Subtrees that never hold article text.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside", "form",
    "iframe", "button", "select", "svg", "canvas", "object", "embed",
];

const UNLIKELY_TOKENS: &[&str] = &[
    "ad", "ads", "advert", "advertisement", "banner", "breadcrumb", "breadcrumbs", "comment",
    "comments", "cookie", "cookies", "footer", "header", "masthead", "menu", "nav", "navbar",
    "navigation", "newsletter", "popup", "promo", "related", "share", "sharing", "sidebar",
    "social", "sponsored", "subscribe", "widget",
];

const POSITIVE_TOKENS: &[&str] = &[
    "article", "blog", "body", "content", "entry", "main", "page", "post", "story", "text",
];

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "cite", "code", "em", "i", "mark", "q", "small", "span", "strong", "sub",
    "sup", "time", "u",
];

const BLOCK_TAGS: &[&str] = &["p", "h2", "h3", "h4", "h5", "h6", "pre", "li", "blockquote"];

/// Paragraphs shorter than this do not contribute to scoring.
const MIN_PARAGRAPH_LEN: usize = 25;

const CLASS_WEIGHT: f64 = 25.0;

/// Readability-style extractor: fetch, score, keep the best block of text.
#[derive(Clone)]
pub struct ReadabilityExtractor {
    fetcher: Arc<HttpFetcher>,
}

impl ReadabilityExtractor {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ArticleExtractor for ReadabilityExtractor {
    async fn extract(&self, url: &str) -> Result<ArticleContent> {
        Url::parse(url)?;
        let html = self.fetcher.fetch_text(url).await?;
        let article = extract_document(url, &html);

        if article.content.is_empty() {
            tracing::warn!("No readable content found at {}", url);
        }
        if article.title.is_none() || article.author.is_none() || article.publish_date.is_none() {
            tracing::debug!(
                "Partial metadata for {} (title: {}, author: {}, date: {})",
                url,
                article.title.is_some(),
                article.author.is_some(),
                article.publish_date.is_some()
            );
        }
        Ok(article)
    }
}

/// Extract content and metadata from an already fetched page.
pub fn extract_document(url: &str, html: &str) -> ArticleContent {
    let document = Html::parse_document(html);
    ArticleContent {
        url: url.to_string(),
        title: metadata::extract_title(&document),
        content: extract_content(&document),
        author: metadata::extract_author(&document),
        publish_date: metadata::extract_publish_date(&document),
    }
}

/// Which boilerplate rules apply while looking for the article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    /// Boilerplate tags, landmark roles and unlikely class/id names.
    Strict,
    /// Boilerplate tags and landmark roles only.
    TagsOnly,
}

/// Main text of the page, paragraphs separated by blank lines.
pub fn extract_content(document: &Html) -> String {
    let content = content_with(document, Filter::Strict);
    if !content.is_empty() {
        return content;
    }
    tracing::debug!("Nothing left after class filtering, retrying with tag filtering only");
    content_with(document, Filter::TagsOnly)
}

fn content_with(document: &Html, filter: Filter) -> String {
    if let Some(best) = best_candidate(document, filter) {
        let text = block_text(best, filter);
        if !text.is_empty() {
            return text;
        }
    }

    // no scorable paragraphs: take whatever paragraphs exist, then the body
    let paragraphs = Selector::parse("p")
        .map(|selector| {
            document
                .select(&selector)
                .filter(|el| !inside_boilerplate(*el, filter))
                .filter_map(|el| clean(&visible_text(el, filter)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }

    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .map(|body| visible_text(body, filter))
        .unwrap_or_default()
}

fn best_candidate(document: &Html, filter: Filter) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("p, pre, td").ok()?;
    let mut scores = HashMap::new();

    for paragraph in document.select(&selector) {
        if inside_boilerplate(paragraph, filter) {
            continue;
        }
        let text = visible_text(paragraph, filter);
        let len = text.chars().count();
        if len < MIN_PARAGRAPH_LEN {
            continue;
        }

        let commas = text.matches(',').count() as f64;
        let score = 1.0 + commas + (len as f64 / 100.0).min(3.0);

        let Some(parent) = paragraph.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        *scores
            .entry(parent.id())
            .or_insert_with(|| initial_score(parent.value())) += score;

        if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
            *scores
                .entry(grandparent.id())
                .or_insert_with(|| initial_score(grandparent.value())) += score / 2.0;
        }
    }

    scores
        .into_iter()
        .filter_map(|(id, score)| {
            let element = document.tree.get(id).and_then(ElementRef::wrap)?;
            Some((element, score * (1.0 - link_density(element, filter))))
        })
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(element, _)| element)
}

fn initial_score(element: &Element) -> f64 {
    let base = match element.name() {
        "div" | "article" | "main" | "section" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    base + class_weight(element)
}

fn class_weight(element: &Element) -> f64 {
    [element.attr("class"), element.id()]
        .into_iter()
        .flatten()
        .map(|value| {
            let tokens = class_tokens(value);
            let mut weight = 0.0;
            if tokens.iter().any(|t| UNLIKELY_TOKENS.contains(&t.as_str())) {
                weight -= CLASS_WEIGHT;
            }
            if tokens.iter().any(|t| POSITIVE_TOKENS.contains(&t.as_str())) {
                weight += CLASS_WEIGHT;
            }
            weight
        })
        .sum()
}

fn class_tokens(value: &str) -> Vec<String> {
    value
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
        .collect()
}

fn is_boilerplate(element: ElementRef<'_>, filter: Filter) -> bool {
    let value = element.value();
    let name = value.name();
    if is_landmark(name) || name == "html" || name == "body" {
        return false;
    }
    if BOILERPLATE_TAGS.contains(&name) {
        return true;
    }
    if matches!(value.attr("role"), Some("navigation" | "banner" | "complementary" | "contentinfo")) {
        return true;
    }
    if filter == Filter::TagsOnly {
        return false;
    }

    let tokens: Vec<String> = [value.attr("class"), value.id()]
        .into_iter()
        .flatten()
        .flat_map(class_tokens)
        .collect();
    let unlikely = tokens.iter().any(|t| UNLIKELY_TOKENS.contains(&t.as_str()))
        && !tokens.iter().any(|t| POSITIVE_TOKENS.contains(&t.as_str()));

    // layout wrappers named after a sidebar or menu may still hold the article
    unlikely
        && !element
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|el| is_landmark(el.value().name()))
}

fn is_landmark(name: &str) -> bool {
    matches!(name, "article" | "main")
}

fn inside_boilerplate(element: ElementRef<'_>, filter: Filter) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| is_boilerplate(el, filter))
}

fn link_density(element: ElementRef<'_>, filter: Filter) -> f64 {
    let total = visible_text(element, filter).chars().count();
    if total == 0 {
        return 0.0;
    }
    let Ok(links) = Selector::parse("a") else {
        return 0.0;
    };
    let linked: usize = element
        .select(&links)
        .map(|a| visible_text(a, filter).chars().count())
        .sum();
    (linked as f64 / total as f64).min(1.0)
}

/// Text of the block elements under `candidate`, one block per paragraph.
fn block_text(candidate: ElementRef<'_>, filter: Filter) -> String {
    let mut blocks = Vec::new();

    for node in candidate.descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if !BLOCK_TAGS.contains(&element.value().name()) {
            continue;
        }
        if has_block_ancestor(element, candidate) || inside_boilerplate(element, filter) {
            continue;
        }
        if link_density(element, filter) > 0.5 {
            continue;
        }
        if let Some(text) = clean(&visible_text(element, filter)) {
            blocks.push(text);
        }
    }

    if blocks.is_empty() {
        return visible_text(candidate, filter);
    }
    blocks.join("\n\n")
}

fn has_block_ancestor(element: ElementRef<'_>, stop: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .take_while(|node| node.id() != stop.id())
        .filter_map(ElementRef::wrap)
        .any(|el| BLOCK_TAGS.contains(&el.value().name()))
}

fn visible_text(element: ElementRef<'_>, filter: Filter) -> String {
    let mut out = String::new();
    push_text(element, filter, &mut out);
    clean(&out).unwrap_or_default()
}

fn push_text(element: ElementRef<'_>, filter: Filter, out: &mut String) {
    if is_boilerplate(element, filter) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    push_text(child, filter, out);
                }
            }
            _ => {}
        }
    }
    if !INLINE_TAGS.contains(&element.value().name()) {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchConfig;
    use crate::test_support::{serve, serve_bytes};

    const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Example News | Rivers rise</title>
  <meta property="og:title" content="Rivers rise after a week of rain">
  <meta name="author" content="Jane Reporter">
  <meta property="article:published_time" content="2024-02-10T07:30:00Z">
  <script>var tracking = "ignore me, please, really";</script>
</head>
<body>
  <nav class="site-nav"><ul><li><a href="/">Home</a></li><li><a href="/world">World</a></li></ul></nav>
  <header><h1>Example News</h1></header>
  <div class="sidebar">
    <p>Subscribe to our newsletter for the latest updates, offers, and more things.</p>
  </div>
  <div class="article-body">
    <p>Rivers across the region rose sharply on Sunday, after a week of steady, heavy rain.</p>
    <p>Officials said the water level was expected to peak on Monday, and residents were told to stay alert.</p>
    <h2>What comes next</h2>
    <p>Forecasters expect drier weather by midweek, although, they cautioned, more storms may follow.</p>
  </div>
  <div class="comments">
    <p>Great article, thanks for sharing this with everyone, I really enjoyed it.</p>
  </div>
  <footer><p>Copyright Example News, all rights reserved, since forever and ever.</p></footer>
</body>
</html>"#;

    #[test]
    fn test_extracts_article_body_only() {
        let article = extract_document("https://example.com/rivers", ARTICLE_HTML);
        let content = article.content;

        assert!(content.starts_with("Rivers across the region rose sharply"));
        assert!(content.contains("What comes next"));
        assert!(content.contains("more storms may follow."));
        assert!(!content.contains("newsletter"));
        assert!(!content.contains("Great article"));
        assert!(!content.contains("Copyright"));
        assert!(!content.contains("tracking"));
        assert!(!content.contains("Home"));
        assert_eq!(content.split("\n\n").count(), 4);
    }

    #[test]
    fn test_extracts_metadata() {
        let article = extract_document("https://example.com/rivers", ARTICLE_HTML);
        assert_eq!(article.url, "https://example.com/rivers");
        assert_eq!(article.title.as_deref(), Some("Rivers rise after a week of rain"));
        assert_eq!(article.author.as_deref(), Some("Jane Reporter"));
        assert_eq!(
            article.publish_date.map(|d| d.to_rfc3339()),
            Some("2024-02-10T07:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_missing_metadata_is_none() {
        let article = extract_document(
            "https://example.com/bare",
            "<html><body><div>short text only</div></body></html>",
        );
        assert_eq!(article.title, None);
        assert_eq!(article.author, None);
        assert_eq!(article.publish_date, None);
        assert_eq!(article.content, "short text only");
    }

    #[test]
    fn test_short_paragraphs_fall_back_to_paragraph_list() {
        let article = extract_document(
            "https://example.com/short",
            "<html><body><p>One.</p><p>Two.</p></body></html>",
        );
        assert_eq!(article.content, "One.\n\nTwo.");
    }

    #[test]
    fn test_link_heavy_blocks_lose() {
        let html = r#"<html><body>
          <div id="links">
            <p><a href="/a">A very long link text that goes on and on, and on, and on</a></p>
            <p><a href="/b">Another very long link text, going on and on, and on again</a></p>
          </div>
          <div id="story">
            <p>This is the actual story text, which is long enough to be scored here.</p>
          </div>
        </body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(
            extract_content(&document),
            "This is the actual story text, which is long enough to be scored here."
        );
    }

    #[test]
    fn test_boilerplate_detection() {
        let document = Html::parse_document(
            r#"<div class="share-buttons">x</div><div class="article-header">y</div><aside>z</aside>"#,
        );
        let selector = Selector::parse("div, aside").unwrap();
        let flags = |filter| {
            document
                .select(&selector)
                .map(|el| is_boilerplate(el, filter))
                .collect::<Vec<bool>>()
        };
        assert_eq!(flags(Filter::Strict), vec![true, false, true]);
        assert_eq!(flags(Filter::TagsOnly), vec![false, false, true]);
    }

    #[test]
    fn test_unlikely_wrapper_does_not_hide_article() {
        let html = r#"<html><body>
          <div class="container with-sidebar">
            <article>
              <p>Rivers across the region rose sharply on Sunday, after a week of steady, heavy rain.</p>
              <p>Officials said the water level was expected to peak on Monday, and residents were told to stay alert.</p>
            </article>
            <div class="sidebar"><p>Subscribe to our newsletter for the latest updates, offers, and more.</p></div>
          </div>
        </body></html>"#;
        let content = extract_content(&Html::parse_document(html));
        assert!(content.starts_with("Rivers across the region rose sharply"));
        assert!(content.contains("residents were told to stay alert."));
        assert!(!content.contains("newsletter"));
    }

    #[test]
    fn test_retries_without_class_filters() {
        let html = r#"<html><body>
          <div class="layout with-sidebar">
            <div class="inner">
              <p>Forecasters expect drier weather by midweek, although, they cautioned, more storms may follow.</p>
            </div>
          </div>
        </body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(content_with(&document, Filter::Strict), "");
        assert_eq!(
            extract_content(&document),
            "Forecasters expect drier weather by midweek, although, they cautioned, more storms may follow."
        );
    }

    #[tokio::test]
    async fn test_extract_over_http() {
        let base = serve(200, "text/html; charset=utf-8", ARTICLE_HTML).await;
        let fetcher = Arc::new(HttpFetcher::new(&FetchConfig::default()).unwrap());
        let article = ReadabilityExtractor::new(fetcher).extract(&base).await.unwrap();
        assert_eq!(article.url, base);
        assert!(article.content.contains("Rivers across the region"));
    }

    #[tokio::test]
    async fn test_extract_latin1_page() {
        let base = serve_bytes(
            200,
            "text/html; charset=iso-8859-1",
            b"<html><body><p>Le caf\xE9 est ouvert, dit le patron, depuis longtemps.</p></body></html>",
        )
        .await;
        let fetcher = Arc::new(HttpFetcher::new(&FetchConfig::default()).unwrap());
        let article = ReadabilityExtractor::new(fetcher).extract(&base).await.unwrap();
        assert_eq!(article.content, "Le caf\u{e9} est ouvert, dit le patron, depuis longtemps.");
    }

    #[tokio::test]
    async fn test_invalid_url_is_validation_error() {
        let fetcher = Arc::new(HttpFetcher::new(&FetchConfig::default()).unwrap());
        let err = ReadabilityExtractor::new(fetcher).extract("not a url").await.unwrap_err();
        assert_eq!(err.kind(), fd_core::ErrorKind::Validation);
    }
}
