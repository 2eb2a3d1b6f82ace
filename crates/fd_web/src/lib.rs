use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/feeds", post(handlers::add_feed).get(handlers::list_feeds))
        .route("/api/feeds/:feed_id/articles", get(handlers::get_feed_articles))
        .route("/api/articles/:article_url/summary", get(handlers::get_article_summary))
        .route("/api/summaries", post(handlers::summarize))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> fd_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| fd_core::Error::Config(format!("cannot bind {}: {}", addr, e)))?;
    tracing::info!("🌐 Listening on http://{}", addr);
    axum::serve(listener, create_app(state))
        .await
        .map_err(|e| fd_core::Error::External(e.into()))
}

pub mod prelude {
    pub use crate::{create_app, AppState};
    pub use fd_core::{Error, Result};
}
