use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    Json,
};
use fd_core::{ArticleStub, FeedDescriptor, Summary};
use serde::{Deserialize, Serialize};
use crate::error::ApiResult;
use crate::AppState;

/// Fields are optional so a missing one is reported as a validation error.
#[derive(Debug, Deserialize)]
pub struct AddFeedRequest {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub message: String,
    pub feed: FeedDescriptor,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedListResponse {
    pub message: String,
    pub feeds: Vec<FeedDescriptor>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeResponse {
    pub message: String,
    pub summary_id: String,
    pub summary: String,
}

pub async fn add_feed(
    State(state): State<AppState>,
    payload: Result<Json<AddFeedRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<FeedResponse>)> {
    let Json(request) = payload?;
    let feed = state
        .manager
        .register_feed(
            request.name.as_deref().unwrap_or_default(),
            request.url.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FeedResponse {
            message: "Feed added successfully".to_string(),
            feed,
        }),
    ))
}

pub async fn list_feeds(State(state): State<AppState>) -> ApiResult<Json<FeedListResponse>> {
    let feeds = state.manager.list_feeds().await?;
    Ok(Json(FeedListResponse {
        message: "Supported feeds retrieved successfully".to_string(),
        feeds,
    }))
}

pub async fn get_feed_articles(
    State(state): State<AppState>,
    feed_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<ArticleStub>>> {
    let Path(feed_id) = feed_id?;
    Ok(Json(state.manager.get_feed_articles(&feed_id).await?))
}

/// The article url arrives percent-encoded as a single path segment.
pub async fn get_article_summary(
    State(state): State<AppState>,
    article_url: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Summary>> {
    let Path(article_url) = article_url?;
    Ok(Json(state.manager.get_article_summary(&article_url).await?))
}

pub async fn summarize(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> ApiResult<Json<SummarizeResponse>> {
    let Json(request) = payload?;
    let summary = state
        .manager
        .summarize_url(request.url.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(SummarizeResponse {
        message: "Summarization successful".to_string(),
        summary_id: summary.id,
        summary: summary.summary,
    }))
}
