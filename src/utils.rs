//! Utility functions for text handling and Telegram retries.

use anyhow::Result;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;

/// Safely truncates a string to a maximum character length (not bytes).
///
/// This is UTF-8 safe and will not panic on multi-byte characters.
///
/// # Examples
///
/// ```
/// use newsfeed_bot::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Joins pre-rendered blocks into messages of at most `max_chars` characters.
///
/// Blocks are never split, so markup inside a block stays balanced. A block
/// that alone exceeds the limit is truncated.
///
/// # Examples
///
/// ```
/// use newsfeed_bot::utils::join_blocks;
/// let blocks = vec!["aaaa".to_string(), "bbbb".to_string()];
/// assert_eq!(join_blocks(&blocks, 10), vec!["aaaa\n\nbbbb"]);
/// assert_eq!(join_blocks(&blocks, 6), vec!["aaaa", "bbbb"]);
/// ```
#[must_use]
pub fn join_blocks(blocks: &[String], max_chars: usize) -> Vec<String> {
    const SEPARATOR: &str = "\n\n";

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for block in blocks {
        let block = truncate_str(block, max_chars);
        let block_len = block.chars().count();

        if !current.is_empty() && current_len + SEPARATOR.len() + block_len > max_chars {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push_str(SEPARATOR);
            current_len += SEPARATOR.len();
        }
        current.push_str(&block);
        current_len += block_len;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Retry a Telegram API operation with exponential backoff.
///
/// The retry strategy uses exponential backoff with jitter:
/// - Initial delay: 500ms
/// - Max delay: 4s
/// - Max attempts: 3 (see constants in `config.rs`)
///
/// # Examples
///
/// ```no_run
/// use newsfeed_bot::utils::retry_telegram_operation;
/// use anyhow::Result;
///
/// async fn send() -> Result<()> {
///     Ok(())
/// }
///
/// # async fn example() -> Result<()> {
/// retry_telegram_operation(|| async { send().await }).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error if all attempts fail.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} attempts: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}
