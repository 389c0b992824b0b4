//! Public read-only feed API
//!
//! Unauthenticated JSON listing of the feed plus a media proxy that
//! resolves Telegram file ids on demand.

/// HTTP rendering of feed errors
pub mod error;
/// Route handlers
pub mod handlers;

use crate::feed::FeedService;
use crate::media::FileResolver;
use anyhow::Context;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Feed business logic
    pub feed: FeedService,
    /// Media file resolver
    pub resolver: Arc<dyn FileResolver>,
    /// Base URL for media links, without trailing slash
    pub public_base_url: String,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/news", get(handlers::list_news))
        .route("/media/{file_id}", get(handlers::get_media))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the API listen address.
///
/// # Errors
///
/// Returns an error if the address is invalid or already in use.
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding feed API to {addr}"))?;
    info!("Feed API listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serve the API on a bound listener until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(
    state: AppState,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Feed API stopped.");
    Ok(())
}
