//! Storage layer for news items
//!
//! One repository interface with two interchangeable backends: an embedded
//! SQLite file and a networked PostgreSQL server. The backend is chosen at
//! startup by the presence of `DATABASE_URL`.

use crate::config::Settings;
use crate::error::{FeedError, FeedResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Networked PostgreSQL backend
pub mod postgres;
/// Embedded SQLite backend
pub mod sqlite;

pub use postgres::PostgresNewsRepository;
pub use sqlite::SqliteNewsRepository;

/// A persisted news item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Identifier assigned by the repository
    pub id: i64,
    /// Headline, never empty
    pub title: String,
    /// Body text, may be empty
    pub description: String,
    /// Free-form date label supplied by the administrator
    pub date_text: String,
    /// Insertion timestamp
    pub created_at: DateTime<Utc>,
    /// Telegram file identifiers of attached photos, in order
    pub photo_file_ids: Vec<String>,
}

/// Payload for inserting a news item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNewsItem {
    /// Headline
    pub title: String,
    /// Body text
    pub description: String,
    /// Free-form date label
    pub date_text: String,
    /// Telegram file identifiers of attached photos
    pub photo_file_ids: Vec<String>,
}

/// Interface for news storage backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Ensure the schema exists. Safe to call repeatedly.
    async fn init(&self) -> FeedResult<()>;
    /// Insert an item and return its assigned identifier
    async fn add(&self, item: NewNewsItem) -> FeedResult<i64>;
    /// Newest items first, at most `limit`
    async fn list(&self, limit: usize) -> FeedResult<Vec<NewsItem>>;
    /// Fetch a single item
    async fn get(&self, id: i64) -> FeedResult<Option<NewsItem>>;
    /// Remove an item, returning whether a row was actually deleted
    async fn delete(&self, id: i64) -> FeedResult<bool>;
    /// Check connection to the backend
    async fn check_connection(&self) -> FeedResult<()>;
}

/// Raw database row shared by both backends
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct NewsRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date_text: String,
    pub photo_file_ids: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NewsRow> for NewsItem {
    type Error = FeedError;

    fn try_from(row: NewsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            date_text: row.date_text,
            created_at: row.created_at,
            photo_file_ids: serde_json::from_str(&row.photo_file_ids)?,
        })
    }
}

pub(crate) fn rows_to_items(rows: Vec<NewsRow>) -> FeedResult<Vec<NewsItem>> {
    rows.into_iter().map(NewsItem::try_from).collect()
}

/// Clamp a listing limit to the range accepted by SQL `LIMIT`
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Open the configured backend and make sure its schema exists.
///
/// # Errors
///
/// Returns `FeedError::Storage` if the database cannot be reached or
/// initialized.
pub async fn connect(settings: &Settings) -> FeedResult<Arc<dyn NewsRepository>> {
    let repo: Arc<dyn NewsRepository> = if let Some(url) = settings.database_url() {
        info!("Using PostgreSQL news storage.");
        Arc::new(PostgresNewsRepository::connect(url).await?)
    } else {
        info!("Using SQLite news storage at {}.", settings.sqlite_path);
        Arc::new(SqliteNewsRepository::open(&settings.sqlite_path).await?)
    };
    repo.init().await?;
    Ok(repo)
}
