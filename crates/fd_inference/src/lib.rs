use std::fmt;
use std::time::Duration;

pub mod models;

#[cfg(test)]
mod test_support;

/// Upper bound for one summarization round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const SYSTEM_PROMPT: &str =
    "You are a news article summarizer. Provide a clear, concise one-paragraph summary of the article.";

#[derive(Clone)]
pub struct Config {
    /// Model family: placeholder, extractive, openai, local, deepseek or anthropic.
    pub model: String,
    pub api_key: Option<String>,
    /// Overrides the family's default model name.
    pub model_name: Option<String>,
    /// Overrides the family's default API base url.
    pub model_url: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "placeholder".to_string(),
            api_key: None,
            model_name: None,
            model_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("model_url", &self.model_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::Config;
    pub use fd_core::{ArticleContent, Error, InferenceModel, Result};
}

pub use models::create_model;
