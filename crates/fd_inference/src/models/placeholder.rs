use fd_core::{ArticleContent, InferenceModel, Result};

/// Returns a fixed sentence naming the url. Useful for wiring and demos.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderModel;

#[async_trait::async_trait]
impl InferenceModel for PlaceholderModel {
    fn name(&self) -> &str {
        "Placeholder"
    }

    async fn summarize_article(&self, article: &ArticleContent) -> Result<String> {
        Ok(format!("Summary of content from {}", article.url))
    }
}
