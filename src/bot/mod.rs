//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles `/start`, the trigger word and other messages
//! - `callback_handler`: Handles the main menu callback queries
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callback_handler;
pub mod message_handler;
pub mod ui_builder;

use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::User as TelegramUser;
use tracing::info;

use crate::config::BotConfig;
use crate::db::Store;
use crate::models::User;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Upsert the Telegram account behind an update; every contact refreshes the name fields
pub async fn register_telegram_user(store: &Store, from: &TelegramUser) -> Result<User> {
    store
        .register_user(
            from.id.0 as i64,
            from.username.as_deref(),
            Some(from.first_name.as_str()),
            from.last_name.as_deref(),
        )
        .await
}

/// Update routing: messages and callback queries
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}

/// Run the long-polling dispatcher until Ctrl-C
pub async fn run(bot: Bot, store: Store, config: BotConfig) {
    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![store, Arc::new(config)])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
