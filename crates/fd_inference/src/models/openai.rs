use async_trait::async_trait;
use fd_core::{ArticleContent, Error, InferenceModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use super::{article_prompt, check_status, http_client, require_api_key};
use crate::{Config, SYSTEM_PROMPT};

const OPENAI_URL: &str = "https://api.openai.com/v1";
const OPENAI_MODEL: &str = "gpt-4o-mini";
const LOCAL_URL: &str = "http://localhost:8000/v1";
const LOCAL_MODEL: &str = "hermes-3-llama-3.1-8b";
const DEEPSEEK_URL: &str = "https://api.deepseek.com/v1";
const DEEPSEEK_MODEL: &str = "deepseek-chat";

const TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Any server speaking the OpenAI chat completions protocol.
pub struct ChatCompletionsModel {
    client: Client,
    provider: &'static str,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl ChatCompletionsModel {
    pub fn openai(config: &Config) -> Result<Self> {
        let api_key = require_api_key(config, "OpenAI")?;
        Self::build(config, "OpenAI", Some(api_key), OPENAI_URL, OPENAI_MODEL)
    }

    /// Self-hosted server; the key is optional.
    pub fn local(config: &Config) -> Result<Self> {
        Self::build(config, "Local", config.api_key.clone(), LOCAL_URL, LOCAL_MODEL)
    }

    pub fn deepseek(config: &Config) -> Result<Self> {
        let api_key = require_api_key(config, "DeepSeek")?;
        Self::build(config, "DeepSeek", Some(api_key), DEEPSEEK_URL, DEEPSEEK_MODEL)
    }

    fn build(
        config: &Config,
        provider: &'static str,
        api_key: Option<String>,
        default_url: &str,
        default_model: &str,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout)?,
            provider,
            api_key,
            base_url: config
                .model_url
                .as_deref()
                .unwrap_or(default_url)
                .trim_end_matches('/')
                .to_string(),
            model: config
                .model_name
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
        })
    }
}

impl fmt::Debug for ChatCompletionsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsModel")
            .field("client", &"<reqwest::Client>")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for ChatCompletionsModel {
    fn name(&self) -> &str {
        self.provider
    }

    async fn summarize_article(&self, article: &ArticleContent) -> Result<String> {
        let prompt = article_prompt(article);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = check_status(builder.send().await?, self.provider).await?;
        let response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::Inference(format!("{} sent an unreadable reply: {}", self.provider, e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::Inference(format!("No content returned from {} API", self.provider)))
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
            title: Some("Budget passes".to_string()),
            content: "The council approved the budget on Monday.".to_string(),
            author: None,
            publish_date: None,
        }
    }

    fn config(url: &str) -> Config {
        Config {
            model: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            model_url: Some(url.to_string()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_summarize_sends_chat_request() {
        let (url, recorded) = serve_json(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":" The council passed the budget. "}}]}"#,
        )
        .await;
        let model = ChatCompletionsModel::openai(&config(&url)).unwrap();

        let summary = model.summarize_article(&article()).await.unwrap();
        assert_eq!(summary, "The council passed the budget.");

        let requests = recorded.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.starts_with("POST /chat/completions"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains("gpt-4o-mini"));
        assert!(request.contains(SYSTEM_PROMPT));
        assert!(request.contains("Budget passes"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_inference_error() {
        let (url, _) = serve_json(200, r#"{"choices":[]}"#).await;
        let model = ChatCompletionsModel::openai(&config(&url)).unwrap();
        let err = model.summarize_article(&article()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }

    #[tokio::test]
    async fn test_provider_error_status() {
        let (url, _) = serve_json(401, r#"{"error":{"message":"bad key"}}"#).await;
        let model = ChatCompletionsModel::openai(&config(&url)).unwrap();
        let err = model.summarize_article(&article()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_local_model_without_key() {
        let (url, recorded) =
            serve_json(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#).await;
        let config = Config {
            model: "local".to_string(),
            model_url: Some(format!("{}/", url)),
            model_name: Some("tiny".to_string()),
            ..Config::default()
        };
        let model = ChatCompletionsModel::local(&config).unwrap();
        assert_eq!(model.name(), "Local");
        assert_eq!(model.summarize_article(&article()).await.unwrap(), "ok");

        let request = &recorded.requests()[0];
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
        assert!(request.contains("\"tiny\""));
    }

    #[test]
    fn test_debug_hides_key() {
        let model = ChatCompletionsModel::openai(&config("http://localhost")).unwrap();
        assert!(!format!("{:?}", model).contains("sk-test"));
    }
}
