use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::{Path, Query};
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use newsfeed_bot::api::{self, router, AppState};
use newsfeed_bot::error::{FeedError, FeedResult};
use newsfeed_bot::feed::FeedService;
use newsfeed_bot::media::{FileResolver, MediaStream, TelegramFileResolver};
use newsfeed_bot::storage::{NewsRepository, SqliteNewsRepository};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const PHOTO_BYTES: &[u8] = b"\x89PNG fake image";

/// Resolver serving a fixed set of files from memory
struct FakeResolver {
    files: HashMap<String, String>,
}

impl FakeResolver {
    fn with_photo(file_id: &str, path: &str) -> Self {
        Self {
            files: HashMap::from([(file_id.to_string(), path.to_string())]),
        }
    }
}

#[async_trait]
impl FileResolver for FakeResolver {
    async fn resolve(&self, file_id: &str) -> FeedResult<String> {
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(format!("media {file_id}")))
    }

    async fn fetch(&self, _file_path: &str) -> FeedResult<MediaStream> {
        Ok(stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(
            PHOTO_BYTES,
        ))]).boxed())
    }
}

async fn state_with(resolver: Arc<dyn FileResolver>, base: &str) -> FeedResult<AppState> {
    let repo = SqliteNewsRepository::in_memory().await?;
    repo.init().await?;
    Ok(AppState {
        feed: FeedService::new(Arc::new(repo)),
        resolver,
        public_base_url: base.to_string(),
    })
}

async fn get_request(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, headers, body)
}

fn json(body: &Bytes) -> Value {
    serde_json::from_slice(body).expect("body should be JSON")
}

#[tokio::test]
async fn test_health() -> FeedResult<()> {
    let state = state_with(Arc::new(FakeResolver::with_photo("a", "a.jpg")), "").await?;
    let (status, _, body) = get_request(router(state), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_news_empty() -> FeedResult<()> {
    let state = state_with(Arc::new(FakeResolver::with_photo("a", "a.jpg")), "").await?;
    let (status, _, body) = get_request(router(state), "/news").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!([]));
    Ok(())
}

#[tokio::test]
async fn test_news_lists_newest_first_with_photo_urls() -> FeedResult<()> {
    let state = state_with(
        Arc::new(FakeResolver::with_photo("a", "a.jpg")),
        "https://news.example.com",
    )
    .await?;
    state.feed.add("Older", "", "01.01.2030", Vec::new()).await?;
    let newer = state
        .feed
        .add(
            "Newer",
            "Details",
            "02.01.2030",
            vec!["AgAC1".to_string(), "AgAC2".to_string()],
        )
        .await?;

    let (status, headers, body) = get_request(router(state), "/news").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json")));

    let items = json(&body);
    let items = items.as_array().expect("array expected");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], newer.id);
    assert_eq!(items[0]["title"], "Newer");
    assert_eq!(items[0]["description"], "Details");
    assert_eq!(items[0]["date"], "02.01.2030");
    assert_eq!(
        items[0]["photos"],
        serde_json::json!([
            "https://news.example.com/media/AgAC1",
            "https://news.example.com/media/AgAC2"
        ])
    );
    assert_eq!(items[1]["photos"], serde_json::json!([]));
    Ok(())
}

#[tokio::test]
async fn test_news_is_capped_at_fifty() -> FeedResult<()> {
    let state = state_with(Arc::new(FakeResolver::with_photo("a", "a.jpg")), "").await?;
    for i in 0..55 {
        state
            .feed
            .add(&format!("Item {i}"), "", "today", Vec::new())
            .await?;
    }

    let (_, _, body) = get_request(router(state), "/news").await;
    let items = json(&body);
    let items = items.as_array().expect("array expected");
    assert_eq!(items.len(), 50);
    assert_eq!(items[0]["title"], "Item 54");
    Ok(())
}

#[tokio::test]
async fn test_media_proxy_streams_content() -> FeedResult<()> {
    let state = state_with(
        Arc::new(FakeResolver::with_photo("AgAC1", "photos/file_7.png")),
        "",
    )
    .await?;

    let (status, headers, body) = get_request(router(state), "/media/AgAC1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=86400");
    assert_eq!(body.as_ref(), PHOTO_BYTES);
    Ok(())
}

#[tokio::test]
async fn test_media_unknown_id_is_not_found() -> FeedResult<()> {
    let state = state_with(Arc::new(FakeResolver::with_photo("a", "a.jpg")), "").await?;
    let (status, _, body) = get_request(router(state), "/media/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_media_without_token_is_server_error() -> FeedResult<()> {
    let resolver = Arc::new(TelegramFileResolver::new("http://127.0.0.1:9", None));
    let state = state_with(resolver, "").await?;
    let (status, _, body) = get_request(router(state), "/media/AgAC1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["code"], "CONFIGURATION_ERROR");
    Ok(())
}

/// Minimal stand-in for the Bot API file endpoints.
///
/// `AgAC1` resolves and downloads, `gone` resolves to a path that no longer
/// downloads, `slow` answers `getFile` only after two seconds.
async fn spawn_fake_bot_api() -> String {
    async fn get_file(
        Path(bot): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        let file_path = match params.get("file_id").map(String::as_str) {
            _ if bot != "bot123:SECRET" => None,
            Some("AgAC1") => Some("photos/file_1.webp"),
            Some("gone") => Some("photos/gone.jpg"),
            Some("slow") => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Some("photos/slow.jpg")
            }
            _ => None,
        };
        match file_path {
            Some(file_path) => Json(serde_json::json!({
                "ok": true,
                "result": {"file_id": "x", "file_unique_id": "u", "file_path": file_path}
            })),
            None => Json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: invalid file_id"
            })),
        }
    }

    async fn download(
        Path((bot, path)): Path<(String, String)>,
    ) -> Result<&'static [u8], StatusCode> {
        if bot == "bot123:SECRET" && path == "photos/file_1.webp" {
            Ok(PHOTO_BYTES)
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    let app = Router::new()
        .route("/{bot}/getFile", get(get_file))
        .route("/file/{bot}/{*path}", get(download));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake Bot API");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

async fn fake_bot_api_app() -> FeedResult<Router> {
    let api_url = spawn_fake_bot_api().await;
    let resolver = TelegramFileResolver::new(&api_url, Some("123:SECRET".to_string()))
        .with_timeouts(Duration::from_millis(300), Duration::from_millis(300));
    let state = state_with(Arc::new(resolver), "").await?;
    Ok(router(state))
}

#[tokio::test]
async fn test_telegram_resolver_against_fake_bot_api() -> FeedResult<()> {
    let app = fake_bot_api_app().await?;

    let (status, headers, body) = get_request(app.clone(), "/media/AgAC1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/webp");
    assert_eq!(body.as_ref(), PHOTO_BYTES);

    let (status, _, body) = get_request(app, "/media/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!String::from_utf8_lossy(&body).contains("SECRET"));
    Ok(())
}

#[tokio::test]
async fn test_failed_download_after_lookup_is_not_found() -> FeedResult<()> {
    let app = fake_bot_api_app().await?;

    let (status, _, body) = get_request(app, "/media/gone").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_lookup_timeout_is_bad_gateway() -> FeedResult<()> {
    let app = fake_bot_api_app().await?;

    let (status, _, body) = get_request(app, "/media/slow").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body = json(&body);
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert!(!body["error"].to_string().contains("SECRET"));
    Ok(())
}

#[tokio::test]
async fn test_photo_urls_are_percent_encoded() -> FeedResult<()> {
    let state = state_with(
        Arc::new(FakeResolver::with_photo("a", "a.jpg")),
        "https://news.example.com/",
    )
    .await?;
    state
        .feed
        .add("Odd id", "", "today", vec!["a b/c?d".to_string()])
        .await?;

    let (_, _, body) = get_request(router(state), "/news").await;
    assert_eq!(
        json(&body)[0]["photos"][0],
        "https://news.example.com/media/a%20b%2Fc%3Fd"
    );
    Ok(())
}

#[tokio::test]
async fn test_bind_rejects_busy_or_invalid_address() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test port");
    let addr = taken.local_addr().expect("local address").to_string();

    assert!(api::bind(&addr).await.is_err());
    assert!(api::bind("not-an-address").await.is_err());
}

#[tokio::test]
async fn test_serve_stops_on_shutdown() -> anyhow::Result<()> {
    let state = state_with(Arc::new(FakeResolver::with_photo("a", "a.jpg")), "").await?;
    let listener = api::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(api::serve(state, listener, shutdown.clone()));

    let health: Value = reqwest::get(format!("http://{addr}/health"))
        .await?
        .json()
        .await?;
    assert_eq!(health["status"], "ok");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), server).await???;
    Ok(())
}
