use super::AppState;
use crate::config::{FEED_API_LIMIT, MEDIA_CACHE_MAX_AGE_SECS};
use crate::error::FeedError;
use crate::media::fetch_media;
use crate::storage::NewsItem;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

/// Public representation of a news item
#[derive(Debug, Serialize)]
pub struct NewsResponse {
    /// Item identifier
    pub id: i64,
    /// Headline
    pub title: String,
    /// Body text
    pub description: String,
    /// Date label as entered by the administrator
    pub date: String,
    /// Absolute (or base-relative) URLs of attached photos
    pub photos: Vec<String>,
}

impl NewsResponse {
    /// Build the response for `item`, deriving photo URLs from `base_url`
    #[must_use]
    pub fn from_item(item: NewsItem, base_url: &str) -> Self {
        let photos = item
            .photo_file_ids
            .iter()
            .map(|file_id| media_url(base_url, file_id))
            .collect();
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            date: item.date_text,
            photos,
        }
    }
}

/// URL under which the API proxies a media file. The id is percent-encoded
/// as a single path segment.
#[must_use]
pub fn media_url(base_url: &str, file_id: &str) -> String {
    format!(
        "{}/media/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(file_id)
    )
}

/// Health check
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /news`
pub async fn list_news(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsResponse>>, FeedError> {
    let items = state.feed.list(FEED_API_LIMIT).await?;
    debug!("Serving {} news items", items.len());
    Ok(Json(
        items
            .into_iter()
            .map(|item| NewsResponse::from_item(item, &state.public_base_url))
            .collect(),
    ))
}

/// `GET /media/{file_id}`
pub async fn get_media(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, FeedError> {
    let media = fetch_media(state.resolver.as_ref(), &file_id).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, media.content_type.to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={MEDIA_CACHE_MAX_AGE_SECS}"),
            ),
        ],
        Body::from_stream(media.body),
    )
        .into_response())
}
