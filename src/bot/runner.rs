use super::handlers::{self, get_user_id_safe, Command};
use crate::config::Settings;
use crate::wizard::AdminWizard;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

/// Run the Telegram dispatcher until Ctrl-C.
pub async fn run_bot(token: &str, settings: Arc<Settings>, wizard: Arc<AdminWizard>) {
    let mut bot = Bot::new(token);
    match reqwest::Url::parse(&settings.telegram_api_url) {
        Ok(url) => bot = bot.set_api_url(url),
        Err(e) => warn!(
            "Invalid TELEGRAM_API_URL '{}', using the default: {e}",
            settings.telegram_api_url
        ),
    }
    let handler = setup_handler();

    info!("Bot is running (admin id {})...", settings.admin_id);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![settings, wizard])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Build the update routing tree
#[must_use]
pub fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            // Administrator
            dptree::filter(|msg: Message, settings: Arc<Settings>| {
                settings.is_admin(get_user_id_safe(&msg))
            })
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(handle_photo))
            .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text)),
        )
        .branch(
            // Everyone else: /start gets a notice, everything else is ignored
            dptree::entry()
                .filter_command::<Command>()
                .filter(|cmd: Command| cmd == Command::Start)
                .endpoint(handle_restricted_start),
        )
        .branch(dptree::endpoint(handle_ignored))
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    wizard: Arc<AdminWizard>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg, wizard).await,
        Command::Cancel => handlers::cancel(bot, msg, wizard).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    wizard: Arc<AdminWizard>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_text(bot, msg, wizard).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_photo(
    bot: Bot,
    msg: Message,
    wizard: Arc<AdminWizard>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_photo(bot, msg, wizard).await {
        error!("Photo handler error: {}", e);
    }
    respond(())
}

async fn handle_restricted_start(
    bot: Bot,
    msg: Message,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::restricted_start(bot, msg).await {
        error!("Restricted start handler error: {}", e);
    }
    respond(())
}

async fn handle_ignored(msg: Message) -> Result<(), teloxide::RequestError> {
    debug!(
        "Ignoring update from user {} in chat {}",
        get_user_id_safe(&msg),
        msg.chat.id
    );
    respond(())
}
