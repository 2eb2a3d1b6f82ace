use fd_scrapers::DigestManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<DigestManager>,
}

impl AppState {
    pub fn new(manager: DigestManager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }
}
