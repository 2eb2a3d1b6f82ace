use encoding_rs::{Encoding, UTF_8};
use fd_core::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Total request timeout in seconds.
const TOTAL_TIMEOUT_SECS: u64 = 30;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Largest document we are willing to read (5MB).
const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024;

const USER_AGENT: &str = concat!("feed-digest/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_redirects: usize,
    pub max_body_size: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            timeout: Duration::from_secs(TOTAL_TIMEOUT_SECS),
            max_redirects: MAX_REDIRECTS,
            max_body_size: MAX_BODY_SIZE,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }
}

/// Shared HTTP client for feeds and article pages.
///
/// Every request is bounded by the configured timeouts; nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_size: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_body_size: config.max_body_size,
        })
    }

    /// GET a url and return its body, rejecting error statuses and oversized bodies.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let (body, _) = self.fetch(url).await?;
        Ok(body)
    }

    /// Like [`fetch_bytes`](Self::fetch_bytes), decoded with the charset the server
    /// declares (UTF-8 when it declares none or one we don't know).
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let (body, content_type) = self.fetch(url).await?;
        Ok(decode(&body, content_type.as_deref()))
    }

    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>)> {
        tracing::debug!("Fetching {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("HTTP error {} from {}", status, url)));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_body_size {
                return Err(self.too_large(content_length));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // Content-Length is optional, so the cap is enforced as chunks arrive.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response from {}: {}", url, e)))?
        {
            let read = (body.len() + chunk.len()) as u64;
            if read > self.max_body_size {
                return Err(self.too_large(read));
            }
            body.extend_from_slice(&chunk);
        }

        Ok((body, content_type))
    }

    fn too_large(&self, size: u64) -> Error {
        Error::Transport(format!(
            "document too large: at least {} bytes (max {} bytes)",
            size, self.max_body_size
        ))
    }
}

/// `charset` parameter of a Content-Type header value.
fn charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

fn decode(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    // a BOM wins over the declared charset
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}
