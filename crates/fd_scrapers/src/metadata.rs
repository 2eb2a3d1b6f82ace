//! Best-effort article metadata from HTML.
//!
//! Structured metadata (Open Graph, JSON-LD, article meta tags) is tried first,
//! then visible markup. Every lookup may come back empty.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::{Html, Selector};
use serde_json::Value;

const TITLE_META: &[&str] = &[
    "meta[property='og:title']",
    "meta[name='og:title']",
];

const TITLE_FALLBACK_META: &[&str] = &[
    "meta[name='twitter:title']",
    "meta[property='twitter:title']",
];

const AUTHOR_META: &[&str] = &[
    "meta[name='author']",
    "meta[property='article:author']",
    "meta[name='byl']",
    "meta[name='dc.creator']",
];

const AUTHOR_MARKUP: &[&str] = &["[rel='author']", "[itemprop='author']", ".byline", ".author"];

const DATE_META: &[&str] = &[
    "meta[property='article:published_time']",
    "meta[name='article:published_time']",
    "meta[name='date']",
    "meta[name='pubdate']",
    "meta[name='publish-date']",
    "meta[name='dc.date']",
    "meta[name='DC.date.issued']",
    "meta[itemprop='datePublished']",
];

/// Longest plausible byline; longer matches are usually whole paragraphs.
const MAX_AUTHOR_LEN: usize = 100;

/// Every JSON-LD object in the document, with arrays and `@graph` flattened.
pub fn json_ld_objects(document: &Html) -> Vec<Value> {
    let mut objects = Vec::new();

    if let Ok(script_selector) = Selector::parse("script[type='application/ld+json']") {
        for script in document.select(&script_selector) {
            if let Ok(json) = serde_json::from_str::<Value>(script.text().collect::<String>().trim()) {
                flatten_json_ld(json, &mut objects);
            }
        }
    }

    objects
}

fn flatten_json_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_json_ld(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

pub fn extract_title(document: &Html) -> Option<String> {
    first_meta_content(document, TITLE_META)
        .or_else(|| {
            json_ld_objects(document)
                .iter()
                .find_map(|obj| obj.get("headline").and_then(|h| h.as_str()).and_then(clean))
        })
        .or_else(|| first_meta_content(document, TITLE_FALLBACK_META))
        .or_else(|| first_text(document, "title"))
        .or_else(|| first_text(document, "h1"))
}

/// Extracts authors from JSON-LD metadata in the HTML document.
/// Returns a vector of author names.
pub fn extract_authors(document: &Html) -> Vec<String> {
    let mut authors = Vec::new();

    for json in json_ld_objects(document) {
        if let Some(author) = json.get("author") {
            collect_author_names(author, &mut authors);
        }
    }

    authors.dedup();
    authors
}

fn collect_author_names(author: &Value, authors: &mut Vec<String>) {
    match author {
        Value::Array(arr) => {
            for author_obj in arr {
                collect_author_names(author_obj, authors);
            }
        }
        Value::Object(obj) => {
            if let Some(name) = obj.get("name").and_then(|n| n.as_str()).and_then(clean) {
                authors.push(name);
            }
        }
        Value::String(s) => {
            if let Some(name) = clean(s) {
                authors.push(name);
            }
        }
        _ => {}
    }
}

pub fn extract_author(document: &Html) -> Option<String> {
    let authors = extract_authors(document);
    if !authors.is_empty() {
        return Some(authors.join(", "));
    }

    first_meta_content(document, AUTHOR_META)
        .filter(|author| !author.starts_with("http"))
        .or_else(|| {
            AUTHOR_MARKUP
                .iter()
                .filter_map(|selector| first_text(document, selector))
                .find(|text| text.chars().count() <= MAX_AUTHOR_LEN)
                .map(|text| strip_by_prefix(&text))
        })
}

pub fn extract_publish_date(document: &Html) -> Option<DateTime<Utc>> {
    json_ld_objects(document)
        .iter()
        .filter_map(|obj| obj.get("datePublished").and_then(|d| d.as_str()))
        .find_map(parse_date)
        .or_else(|| {
            DATE_META
                .iter()
                .filter_map(|selector| first_attr(document, selector, "content"))
                .find_map(|value| parse_date(&value))
        })
        .or_else(|| {
            first_attr(document, "time[datetime]", "datetime").and_then(|value| parse_date(&value))
        })
}

/// Parse the date formats seen in the wild; naive values are taken as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

fn first_meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .find_map(|selector| first_attr(document, selector, "content").and_then(|c| clean(&c)))
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .find_map(|el| el.value().attr(attr).map(str::to_string))
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .find_map(|el| clean(&el.text().collect::<String>()))
}

fn strip_by_prefix(text: &str) -> String {
    match text.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("by ") => text[3..].trim().to_string(),
        _ => text.to_string(),
    }
}

/// Collapse whitespace; `None` for blank input.
pub(crate) fn clean(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
