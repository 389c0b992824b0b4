//! Telegram-administered news feed
//!
//! An administrator curates news items through a Telegram chat; the feed is
//! published read-only over HTTP together with a proxy for attached photos.
#![deny(missing_docs)]

/// Public HTTP API
pub mod api;
/// Telegram admin bot
pub mod bot;
/// Configuration and settings
pub mod config;
/// Error types shared across the crate
pub mod error;
/// Feed business logic
pub mod feed;
/// Telegram media resolution
pub mod media;
/// News item persistence
pub mod storage;
/// Utility functions
pub mod utils;
/// Admin dialogue state machine
pub mod wizard;
