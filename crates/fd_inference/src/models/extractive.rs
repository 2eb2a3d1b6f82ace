use fd_core::{ArticleContent, Error, InferenceModel, Result};
use std::fmt;

/// Lead-sentence summarizer that needs no network access.
pub struct ExtractiveModel {
    max_sentences: usize,
    max_words: usize,
}

impl Default for ExtractiveModel {
    fn default() -> Self {
        Self {
            max_sentences: 3,
            max_words: 80,
        }
    }
}

impl fmt::Debug for ExtractiveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractiveModel")
            .field("max_sentences", &self.max_sentences)
            .field("max_words", &self.max_words)
            .finish()
    }
}

impl ExtractiveModel {
    pub fn new(max_sentences: usize, max_words: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
            max_words: max_words.max(1),
        }
    }

    fn lead(&self, text: &str) -> String {
        let mut summary = Vec::new();
        let mut words = 0;

        for sentence in sentences(text).into_iter().take(self.max_sentences) {
            let count = sentence.split_whitespace().count();
            if words + count > self.max_words {
                if summary.is_empty() {
                    // a single overlong sentence is cut at the word limit
                    let cut: Vec<&str> = sentence.split_whitespace().take(self.max_words).collect();
                    summary.push(format!("{}…", cut.join(" ")));
                }
                break;
            }
            words += count;
            summary.push(sentence);
        }

        summary.join(" ")
    }
}

/// Split on terminal punctuation, keeping the punctuation and collapsing whitespace.
fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
        if word.ends_with(['.', '!', '?']) {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }

    out
}

#[async_trait::async_trait]
impl InferenceModel for ExtractiveModel {
    fn name(&self) -> &str {
        "Extractive"
    }

    async fn summarize_article(&self, article: &ArticleContent) -> Result<String> {
        let summary = self.lead(&article.content);
        if summary.is_empty() {
            return Err(Error::Inference(format!(
                "no article text to summarize for {}",
                article.url
            )));
        }
        tracing::debug!("Generated extractive summary: {}", summary);
        Ok(summary)
    }
}
