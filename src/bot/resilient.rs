//! Resilient messaging with automatic retry for Telegram API operations.
//!
//! Wraps `send_message` with exponential backoff so transient network
//! failures do not lose wizard replies.

use super::views::{get_main_keyboard, render_reply};
use crate::config::TELEGRAM_MESSAGE_LIMIT;
use crate::utils::{join_blocks, retry_telegram_operation};
use crate::wizard::Reply;
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tracing::debug;

/// Send an HTML message with automatic retry on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    with_menu: bool,
) -> Result<Message> {
    let text = text.into();
    retry_telegram_operation(|| async {
        let mut req = bot
            .send_message(chat_id, text.clone())
            .parse_mode(ParseMode::Html);
        if with_menu {
            req = req.reply_markup(get_main_keyboard());
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Render and send a wizard reply. `Reply::Ignored` sends nothing.
///
/// # Errors
///
/// Returns an error if the message cannot be delivered.
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply) -> Result<()> {
    match render_reply(reply) {
        Some(rendered) => {
            send_message_resilient(bot, chat_id, rendered.text, rendered.show_menu).await?;
        }
        None => debug!("Nothing to send for {reply:?}"),
    }
    Ok(())
}

/// Send pre-rendered blocks, split to fit the Telegram message limit.
/// The menu keyboard is attached to the last part.
///
/// # Errors
///
/// Returns an error if any part fails to send.
pub async fn send_blocks(bot: &Bot, chat_id: ChatId, blocks: &[String]) -> Result<()> {
    let parts = join_blocks(blocks, TELEGRAM_MESSAGE_LIMIT);
    let last = parts.len().saturating_sub(1);
    for (index, part) in parts.into_iter().enumerate() {
        send_message_resilient(bot, chat_id, part, index == last).await?;
    }
    Ok(())
}
