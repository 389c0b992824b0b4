//! View layer for bot UI components
//!
//! Keyboards, texts and formatters for the admin chat.

use crate::error::FeedError;
use crate::storage::NewsItem;
use crate::wizard::{Reply, Step};
use html_escape::encode_text;
use teloxide::types::{KeyboardButton, KeyboardMarkup};

/// Button that starts the add-news flow
pub const ADD_NEWS_LABEL: &str = "➕ Add news";
/// Button that shows the latest items
pub const SHOW_FEED_LABEL: &str = "📰 Show feed";
/// Button that starts the delete-news flow
pub const DELETE_NEWS_LABEL: &str = "🗑 Delete news";

/// Sent to anyone but the administrator on `/start`
pub const RESTRICTED_NOTICE: &str = "Hi! This bot is available to the administrator only.";

/// Greeting for the administrator
pub const WELCOME_MESSAGE: &str =
    "Hi! I manage the news feed.\nChoose an action with the buttons below:";

/// Prepended to the greeting when `/start` interrupts a dialogue
pub const FLOW_INTERRUPTED_NOTICE: &str = "The unfinished dialogue was discarded.";

/// Hint for idle text that matches no button
pub const MENU_HINT: &str = "Choose an action with the buttons below.";

/// Shown by "show feed" on an empty store
pub const EMPTY_FEED: &str = "No news yet. Press «➕ Add news».";

/// Menu actions reachable from the main keyboard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    /// Start the add flow
    AddNews,
    /// List recent items
    ShowFeed,
    /// Start the delete flow
    DeleteNews,
}

impl MenuAction {
    /// Match a button label
    #[must_use]
    pub fn from_label(text: &str) -> Option<Self> {
        match text.trim() {
            ADD_NEWS_LABEL => Some(Self::AddNews),
            SHOW_FEED_LABEL => Some(Self::ShowFeed),
            DELETE_NEWS_LABEL => Some(Self::DeleteNews),
            _ => None,
        }
    }
}

/// Create the main menu keyboard
///
/// # Examples
///
/// ```
/// use newsfeed_bot::bot::views::get_main_keyboard;
/// let keyboard = get_main_keyboard();
/// assert_eq!(keyboard.keyboard.len(), 3);
/// ```
#[must_use]
pub fn get_main_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new(ADD_NEWS_LABEL)],
        vec![KeyboardButton::new(SHOW_FEED_LABEL)],
        vec![KeyboardButton::new(DELETE_NEWS_LABEL)],
    ];
    KeyboardMarkup::new(keyboard).resize_keyboard()
}

/// HTML text for a wizard reply
pub struct RenderedReply {
    /// Message body (HTML)
    pub text: String,
    /// Attach the main keyboard; set when a flow has ended
    pub show_menu: bool,
}

impl RenderedReply {
    fn prompt(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            show_menu: false,
        }
    }

    fn done(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            show_menu: true,
        }
    }
}

fn step_prompt(step: Step) -> &'static str {
    match step {
        Step::AwaitingTitle => "Enter the news <b>title</b>:\n\n<i>/cancel to abort</i>",
        Step::AwaitingDescription => "Now enter the <b>description</b>:",
        Step::AwaitingDate => {
            "Now enter the <b>date</b> (for example: 23.02.2026 or 2026-02-23):"
        }
        Step::AwaitingDeleteId => {
            "Enter the <b>ID</b> of the news item to delete:\n\n<i>/cancel to abort</i>"
        }
        Step::Idle => MENU_HINT,
    }
}

/// Render a wizard reply. `None` means nothing should be sent.
#[must_use]
pub fn render_reply(reply: &Reply) -> Option<RenderedReply> {
    let rendered = match reply {
        Reply::AskTitle => RenderedReply::prompt(step_prompt(Step::AwaitingTitle)),
        Reply::AskDescription => RenderedReply::prompt(step_prompt(Step::AwaitingDescription)),
        Reply::AskDate => RenderedReply::prompt(step_prompt(Step::AwaitingDate)),
        Reply::AskDeleteId => RenderedReply::prompt(step_prompt(Step::AwaitingDeleteId)),
        Reply::Added(item) => RenderedReply::done(format!(
            "✅ News added (ID: {}).\n\n{}",
            item.id,
            format_news_item(item)
        )),
        Reply::Deleted(id) => RenderedReply::done(format!("🗑 News item {id} deleted.")),
        Reply::NotFound(id) => RenderedReply::done(format!("News item {id} not found.")),
        Reply::InvalidId(raw) => RenderedReply::done(format!(
            "«{}» is not a valid ID. Deletion cancelled.",
            encode_text(raw)
        )),
        Reply::PhotoAttached { count, step } => RenderedReply::prompt(format!(
            "🖼 Photo attached ({count} total).\n\n{}",
            step_prompt(*step)
        )),
        Reply::Cancelled => RenderedReply::done("Cancelled."),
        Reply::NothingToCancel => RenderedReply::done("Nothing to cancel."),
        Reply::Failed(e) => RenderedReply::done(failure_text(e)),
        Reply::Ignored => return None,
    };
    Some(rendered)
}

fn failure_text(e: &FeedError) -> String {
    match e {
        FeedError::Validation(msg) => {
            format!("❌ {}. The draft was discarded.", encode_text(msg))
        }
        _ => "❌ Could not save changes, please try again later.".to_string(),
    }
}

/// Title, description and date of an item, HTML-escaped
#[must_use]
pub fn format_news_item(item: &NewsItem) -> String {
    let mut text = format!("<b>{}</b>", encode_text(&item.title));
    if !item.description.is_empty() {
        text.push('\n');
        text.push_str(&encode_text(&item.description));
    }
    text.push_str(&format!("\n📅 {}", encode_text(&item.date_text)));
    if !item.photo_file_ids.is_empty() {
        text.push_str(&format!("\n🖼 {} photo(s)", item.photo_file_ids.len()));
    }
    text
}

/// One block per item for the "show feed" listing
#[must_use]
pub fn format_feed(items: &[NewsItem]) -> Vec<String> {
    if items.is_empty() {
        return vec![EMPTY_FEED.to_string()];
    }
    let mut blocks = vec!["📰 <b>News feed:</b>".to_string()];
    blocks.extend(
        items
            .iter()
            .map(|item| format!("• #{} {}", item.id, format_news_item(item))),
    );
    blocks
}
