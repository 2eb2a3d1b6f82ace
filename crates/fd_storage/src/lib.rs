use fd_core::{Error, FeedRegistry, Result, SummaryCache};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

pub trait StorageBackend: FeedRegistry + SummaryCache {
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    SQLite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::SQLite),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::SQLite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            db_path: PathBuf::from("feed-digest.db"),
        }
    }
}

/// Store handles shared by every request.
///
/// Registry and cache may be the same backend object behind two trait views.
#[derive(Clone)]
pub struct Storage {
    pub registry: Arc<dyn FeedRegistry>,
    pub cache: Arc<dyn SummaryCache>,
    pub backend: &'static str,
}

impl Storage {
    pub fn from_backend<B: StorageBackend + 'static>(backend: B) -> Self {
        let name = backend.name();
        let backend = Arc::new(backend);
        Self {
            registry: backend.clone(),
            cache: backend,
            backend: name,
        }
    }
}

pub async fn create_storage(config: &StorageConfig) -> Result<Storage> {
    let storage = match config.kind {
        StorageKind::Memory => Storage::from_backend(MemoryStorage::new()),
        #[cfg(feature = "sqlite")]
        StorageKind::SQLite => Storage::from_backend(SQLiteStorage::new_with_path(&config.db_path).await?),
        #[cfg(not(feature = "sqlite"))]
        StorageKind::SQLite => {
            return Err(Error::Config("SQLite support was not compiled in".to_string()))
        }
    };
    tracing::info!("💾 Storage backend initialized (using {})", storage.backend);
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, Storage, StorageConfig, StorageKind};
}
