use super::resilient::{send_blocks, send_message_resilient, send_reply};
use super::views::{
    format_feed, MenuAction, FLOW_INTERRUPTED_NOTICE, MENU_HINT, RESTRICTED_NOTICE,
    WELCOME_MESSAGE,
};
use crate::config::CHAT_FEED_LIMIT;
use crate::utils::truncate_str;
use crate::wizard::{AdminWizard, Reply};
use anyhow::Result;
use std::sync::Arc;
use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::{debug, error, info};

// Helper function to get user name from Message
fn get_user_name(msg: &Message) -> String {
    if let Some(ref user) = msg.from {
        if let Some(ref username) = user.username {
            return username.clone();
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
    }
    "Unknown".to_string()
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the main menu
    #[command(description = "Show the main menu.")]
    Start,
    /// Abort the current dialogue
    #[command(description = "Abort the current dialogue.")]
    Cancel,
}

/// `/start` from the administrator: drop any dialogue and show the menu.
/// An interrupted dialogue is mentioned in the greeting.
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(bot: Bot, msg: Message, wizard: Arc<AdminWizard>) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    info!(
        "User {user_id} ({}) initiated /start command.",
        get_user_name(&msg)
    );

    let text = if wizard.reset(user_id).await {
        format!("{FLOW_INTERRUPTED_NOTICE}\n\n{WELCOME_MESSAGE}")
    } else {
        WELCOME_MESSAGE.to_string()
    };
    send_message_resilient(&bot, msg.chat.id, text, true).await?;
    Ok(())
}

/// `/cancel` from the administrator.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn cancel(bot: Bot, msg: Message, wizard: Arc<AdminWizard>) -> Result<()> {
    let reply = wizard.cancel(get_user_id_safe(&msg)).await;
    send_reply(&bot, msg.chat.id, &reply).await
}

/// `/start` from anyone else: the only action that answers non-admins.
///
/// # Errors
///
/// Returns an error if the notice cannot be sent.
pub async fn restricted_start(bot: Bot, msg: Message) -> Result<()> {
    info!(
        "⛔️ /start from non-admin user {} ({}).",
        get_user_id_safe(&msg),
        get_user_name(&msg)
    );
    bot.send_message(msg.chat.id, RESTRICTED_NOTICE).await?;
    Ok(())
}

/// Text from the administrator.
///
/// While a dialogue is active every text is wizard input, including button
/// labels and slash-prefixed text that is not a known command.
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn handle_text(bot: Bot, msg: Message, wizard: Arc<AdminWizard>) -> Result<()> {
    let text = msg.text().unwrap_or_default();
    let user_id = get_user_id_safe(&msg);

    debug!(
        "Handling text from user {user_id}: '{}'",
        truncate_str(text, 100)
    );

    if wizard.is_active(user_id).await {
        let reply = wizard.handle_text(user_id, text).await;
        return send_reply(&bot, msg.chat.id, &reply).await;
    }

    let reply = match MenuAction::from_label(text) {
        Some(MenuAction::AddNews) => wizard.begin_add(user_id).await,
        Some(MenuAction::DeleteNews) => wizard.begin_delete(user_id).await,
        Some(MenuAction::ShowFeed) => return show_feed(&bot, &msg, &wizard).await,
        None => {
            send_message_resilient(&bot, msg.chat.id, MENU_HINT, true).await?;
            return Ok(());
        }
    };
    send_reply(&bot, msg.chat.id, &reply).await
}

/// Photo from the administrator; attached to the draft during the add flow.
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn handle_photo(bot: Bot, msg: Message, wizard: Arc<AdminWizard>) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    // Telegram lists sizes ascending; keep the largest
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };

    let reply = wizard
        .attach_photo(user_id, &photo.file.id.to_string(), msg.caption())
        .await;
    if matches!(reply, Reply::Ignored) {
        debug!("Photo from user {user_id} outside the add flow ignored.");
    }
    send_reply(&bot, msg.chat.id, &reply).await
}

async fn show_feed(bot: &Bot, msg: &Message, wizard: &AdminWizard) -> Result<()> {
    let user_id = get_user_id_safe(msg);
    info!("User {user_id} requested the feed.");

    match wizard.feed().list(CHAT_FEED_LIMIT).await {
        Ok(items) => send_blocks(bot, msg.chat.id, &format_feed(&items)).await,
        Err(e) => {
            error!("Failed to load feed for user {user_id}: {e}");
            send_message_resilient(
                bot,
                msg.chat.id,
                "❌ Could not load the feed, please try again later.",
                true,
            )
            .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start", "news_bot").ok(), Some(Command::Start));
        assert_eq!(
            Command::parse("/cancel@news_bot", "news_bot").ok(),
            Some(Command::Cancel)
        );
        // Unknown commands fall through to the wizard as plain text
        assert!(Command::parse("/breaking", "news_bot").is_err());
    }
}
