//! Feed business logic
//!
//! Normalizes and validates input before it reaches the repository.
//! Transport-agnostic: used by both the chat bot and the HTTP API.

use crate::error::{FeedError, FeedResult};
use crate::storage::{NewNewsItem, NewsItem, NewsRepository};
use std::sync::Arc;
use tracing::info;

/// Add/list/delete operations over a news repository
#[derive(Clone)]
pub struct FeedService {
    repo: Arc<dyn NewsRepository>,
}

impl FeedService {
    /// Create a service over the given repository
    #[must_use]
    pub fn new(repo: Arc<dyn NewsRepository>) -> Self {
        Self { repo }
    }

    /// Add a news item.
    ///
    /// Title, description and date are trimmed; blank photo ids are dropped.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Validation` if the title is empty after trimming,
    /// or a storage error if the insert fails.
    pub async fn add(
        &self,
        title: &str,
        description: &str,
        date_text: &str,
        photo_file_ids: Vec<String>,
    ) -> FeedResult<NewsItem> {
        let item = NewNewsItem {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            date_text: date_text.trim().to_string(),
            photo_file_ids: photo_file_ids
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        };

        if item.title.is_empty() {
            return Err(FeedError::Validation("title must not be empty".into()));
        }

        let id = self.repo.add(item.clone()).await?;
        info!("News item {id} added ({} photos).", item.photo_file_ids.len());

        match self.repo.get(id).await? {
            Some(stored) => Ok(stored),
            None => Err(FeedError::NotFound(format!(
                "news item {id} disappeared right after insert"
            ))),
        }
    }

    /// Newest items first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list(&self, limit: usize) -> FeedResult<Vec<NewsItem>> {
        self.repo.list(limit).await
    }

    /// Delete an item from a raw, user-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Validation` if the identifier is not a positive
    /// integer and `FeedError::NotFound` if no such item exists.
    pub async fn delete(&self, raw_id: &str) -> FeedResult<i64> {
        let id = parse_news_id(raw_id)?;
        self.delete_by_id(id).await?;
        Ok(id)
    }

    /// Delete an item by numeric identifier.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Validation` for non-positive ids and
    /// `FeedError::NotFound` if no row was removed.
    pub async fn delete_by_id(&self, id: i64) -> FeedResult<()> {
        if id <= 0 {
            return Err(FeedError::Validation(format!(
                "news id must be positive, got {id}"
            )));
        }
        if self.repo.delete(id).await? {
            info!("News item {id} deleted.");
            Ok(())
        } else {
            Err(FeedError::NotFound(format!("news item {id}")))
        }
    }
}

/// Parse a user-supplied news identifier.
///
/// # Errors
///
/// Returns `FeedError::Validation` unless the trimmed text is a positive integer.
pub fn parse_news_id(raw: &str) -> FeedResult<i64> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(FeedError::Validation(format!(
            "'{trimmed}' is not a valid news id"
        ))),
    }
}
