//! Media resolution through the Telegram Bot API
//!
//! Telegram file ids are resolved on demand: `getFile` yields a transient
//! file path, which is then downloaded from the file endpoint. Nothing is
//! stored locally.

use crate::config::{MEDIA_FETCH_TIMEOUT_SECS, MEDIA_LOOKUP_TIMEOUT_SECS};
use crate::error::{FeedError, FeedResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Streamed binary content of a resolved file
pub type MediaStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Two-step file resolution offered by the messaging provider
#[async_trait]
pub trait FileResolver: Send + Sync {
    /// Look up the transient storage path of a file id
    async fn resolve(&self, file_id: &str) -> FeedResult<String>;
    /// Download the content stored at a resolved path
    async fn fetch(&self, file_path: &str) -> FeedResult<MediaStream>;
}

/// Resolved media ready to be sent to a client
pub struct MediaContent {
    /// Content type inferred from the resolved path
    pub content_type: &'static str,
    /// Binary body
    pub body: MediaStream,
}

/// Resolve a file id and open its content stream.
///
/// # Errors
///
/// Propagates `NotFound`, `Configuration` and `Upstream` errors from the
/// resolver.
pub async fn fetch_media(resolver: &dyn FileResolver, file_id: &str) -> FeedResult<MediaContent> {
    let file_path = resolver.resolve(file_id).await?;
    debug!("Media {file_id} resolved to {file_path}");
    let body = resolver.fetch(&file_path).await?;
    Ok(MediaContent {
        content_type: content_type_for_path(&file_path),
        body,
    })
}

/// Infer an image content type from a file path extension.
///
/// Unknown extensions fall back to `image/jpeg`, the format Telegram uses
/// for photos.
#[must_use]
pub fn content_type_for_path(file_path: &str) -> &'static str {
    let extension = file_path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

#[derive(Debug, Deserialize)]
struct GetFileResponse {
    ok: bool,
    result: Option<TelegramFile>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramFile {
    file_path: Option<String>,
}

/// [`FileResolver`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramFileResolver {
    client: HttpClient,
    api_url: String,
    token: Option<String>,
    lookup_timeout: Duration,
    fetch_timeout: Duration,
}

impl TelegramFileResolver {
    /// Create a resolver for the given API base URL.
    /// A missing token makes every call fail with a configuration error.
    #[must_use]
    pub fn new(api_url: &str, token: Option<String>) -> Self {
        Self {
            client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            lookup_timeout: Duration::from_secs(MEDIA_LOOKUP_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(MEDIA_FETCH_TIMEOUT_SECS),
        }
    }

    /// Override the `getFile` and download timeouts
    #[must_use]
    pub fn with_timeouts(mut self, lookup: Duration, fetch: Duration) -> Self {
        self.lookup_timeout = lookup;
        self.fetch_timeout = fetch;
        self
    }

    fn token(&self) -> FeedResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| FeedError::Configuration("BOT_TOKEN is missing".into()))
    }
}

/// Map a transport error without leaking the token-bearing URL
fn upstream_error(stage: &str, e: reqwest::Error) -> FeedError {
    let e = e.without_url();
    if e.is_timeout() {
        FeedError::Upstream(format!("{stage} timed out"))
    } else {
        FeedError::Upstream(format!("{stage} failed: {e}"))
    }
}

#[async_trait]
impl FileResolver for TelegramFileResolver {
    async fn resolve(&self, file_id: &str) -> FeedResult<String> {
        let url = format!("{}/bot{}/getFile", self.api_url, self.token()?);
        let response = self
            .client
            .get(url)
            .query(&[("file_id", file_id)])
            .timeout(self.lookup_timeout)
            .send()
            .await
            .map_err(|e| upstream_error("getFile", e))?;

        let status = response.status();
        let body: GetFileResponse = response.json().await.map_err(|e| {
            warn!("Unexpected getFile response (status {status})");
            upstream_error("getFile decode", e)
        })?;

        match body.result.and_then(|f| f.file_path) {
            Some(path) if body.ok => Ok(path),
            _ => Err(FeedError::NotFound(format!(
                "media {file_id}: {}",
                body.description.unwrap_or_else(|| "no file path".into())
            ))),
        }
    }

    async fn fetch(&self, file_path: &str) -> FeedResult<MediaStream> {
        let url = format!("{}/file/bot{}/{file_path}", self.api_url, self.token()?);
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| upstream_error("file download", e))?;

        if !response.status().is_success() {
            return Err(FeedError::NotFound(format!(
                "file download returned {}",
                response.status()
            )));
        }

        Ok(response
            .bytes_stream()
            .map_err(|e| std::io::Error::other(e.without_url()))
            .boxed())
    }
}
