pub mod error;
pub mod logging;
pub mod models;
pub mod scraping;
pub mod storage;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use models::InferenceModel;
pub use scraping::{ArticleExtractor, SyndicationParser};
pub use storage::{FeedRegistry, SummaryCache};
pub use types::{normalize_url, ArticleContent, ArticleStub, FeedDescriptor, Summary, UNKNOWN_AUTHOR};

pub mod prelude {
    pub use crate::{
        ArticleContent, ArticleExtractor, ArticleStub, Error, FeedDescriptor, FeedRegistry,
        InferenceModel, Result, Summary, SummaryCache, SyndicationParser,
    };
}
