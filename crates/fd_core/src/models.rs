use async_trait::async_trait;
use std::fmt;
use crate::types::ArticleContent;
use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Summarize an extracted article
    async fn summarize_article(&self, article: &ArticleContent) -> Result<String>;
}
