/// Command and message handlers for the admin chat
pub mod handlers;
/// Telegram sends with retry
pub mod resilient;
/// Dispatcher setup and update routing
pub mod runner;
/// Keyboards, texts and formatters
pub mod views;

pub use runner::{run_bot, setup_handler};
