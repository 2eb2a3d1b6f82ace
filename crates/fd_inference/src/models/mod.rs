use fd_core::{ArticleContent, Error, InferenceModel, Result};
use reqwest::{Client, Response};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use crate::Config;

pub mod anthropic;
pub mod extractive;
pub mod openai;
pub mod placeholder;

pub use anthropic::AnthropicModel;
pub use extractive::ExtractiveModel;
pub use openai::ChatCompletionsModel;
pub use placeholder::PlaceholderModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Placeholder,
    Extractive,
    OpenAi,
    Local,
    DeepSeek,
    Anthropic,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placeholder" | "dummy" => Ok(Self::Placeholder),
            "extractive" => Ok(Self::Extractive),
            "openai" => Ok(Self::OpenAi),
            "local" => Ok(Self::Local),
            "deepseek" => Ok(Self::DeepSeek),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(Error::Config(format!("Unsupported model: {}", other))),
        }
    }
}

pub async fn create_model(config: Config) -> Result<Arc<dyn InferenceModel>> {
    let kind: ModelKind = config.model.parse()?;
    let model: Arc<dyn InferenceModel> = match kind {
        ModelKind::Placeholder => Arc::new(PlaceholderModel),
        ModelKind::Extractive => Arc::new(ExtractiveModel::default()),
        ModelKind::OpenAi => Arc::new(ChatCompletionsModel::openai(&config)?),
        ModelKind::Local => Arc::new(ChatCompletionsModel::local(&config)?),
        ModelKind::DeepSeek => Arc::new(ChatCompletionsModel::deepseek(&config)?),
        ModelKind::Anthropic => Arc::new(AnthropicModel::new(&config)?),
    };
    tracing::info!("🧠 Using {} summarizer", model.name());
    Ok(model)
}

/// User turn sent to chat models.
pub(crate) fn article_prompt(article: &ArticleContent) -> String {
    match article.title.as_deref() {
        Some(title) => format!("Title: {}\n\n{}", title, article.content),
        None => article.content.clone(),
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))
}

pub(crate) fn require_api_key(config: &Config, provider: &str) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{} API key is required", provider)))
}

/// Turn a non-2xx provider reply into an inference error carrying its body.
pub(crate) async fn check_status(response: Response, provider: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Inference(format!(
        "{} returned {}: {}",
        provider,
        status,
        body.trim()
    )))
}
