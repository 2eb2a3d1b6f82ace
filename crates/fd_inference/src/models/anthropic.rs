use async_trait::async_trait;
use fd_core::{ArticleContent, Error, InferenceModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use super::{article_prompt, check_status, http_client, require_api_key};
use crate::{Config, SYSTEM_PROMPT};

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_MODEL: &str = "claude-3-sonnet-20240229";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<UserMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicModel {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            api_key: require_api_key(config, "Anthropic")?,
            base_url: config
                .model_url
                .as_deref()
                .unwrap_or(ANTHROPIC_URL)
                .trim_end_matches('/')
                .to_string(),
            model: config
                .model_name
                .clone()
                .unwrap_or_else(|| ANTHROPIC_MODEL.to_string()),
        })
    }
}

impl fmt::Debug for AnthropicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for AnthropicModel {
    fn name(&self) -> &str {
        "Anthropic"
    }

    async fn summarize_article(&self, article: &ArticleContent) -> Result<String> {
        let prompt = article_prompt(article);
        let request = MessagesRequest {
            model: &self.model,
            system: SYSTEM_PROMPT,
            messages: vec![UserMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response, "Anthropic")
            .await?
            .json::<MessagesResponse>()
            .await
            .map_err(|e| Error::Inference(format!("Anthropic sent an unreadable reply: {}", e)))?;

        response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::Inference("No content returned from Anthropic API".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_json;
    use fd_core::ErrorKind;

    fn article() -> ArticleContent {
        ArticleContent {
            url: "https://ex.com/a".to_string(),
            title: None,
            content: "Rain is expected across the region tomorrow.".to_string(),
            author: None,
            publish_date: None,
        }
    }

    fn config(url: &str) -> Config {
        Config {
            model: "anthropic".to_string(),
            api_key: Some("ak-test".to_string()),
            model_url: Some(url.to_string()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_summarize_uses_messages_api() {
        let (url, recorded) = serve_json(
            200,
            r#"{"content":[{"type":"text","text":"Rain tomorrow."}],"stop_reason":"end_turn"}"#,
        )
        .await;
        let model = AnthropicModel::new(&config(&url)).unwrap();
        assert_eq!(model.summarize_article(&article()).await.unwrap(), "Rain tomorrow.");

        let request = &recorded.requests()[0];
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /messages"));
        assert!(lower.contains("x-api-key: ak-test"));
        assert!(lower.contains("anthropic-version: 2023-06-01"));
        assert!(request.contains("\"system\""));
        assert!(request.contains("\"max_tokens\":1000"));
    }

    #[tokio::test]
    async fn test_empty_content_is_inference_error() {
        let (url, _) = serve_json(200, r#"{"content":[]}"#).await;
        let model = AnthropicModel::new(&config(&url)).unwrap();
        let err = model.summarize_article(&article()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }

    #[test]
    fn test_requires_api_key() {
        let config = Config {
            api_key: Some("  ".to_string()),
            ..config("http://localhost")
        };
        let err = AnthropicModel::new(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
