//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use reqwest::Url;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::db::Store;

// Import localization
use crate::localization::t_lang;

// Import UI builder functions
use super::register_telegram_user;
use super::ui_builder::{create_main_menu_keyboard, format_welcome_message, mini_app_url};

/// Words that open the shop the same way `/start` does
const TRIGGER_WORDS: &[&str] = &["магазин", "shop"];

/// Whether a text message asks for the welcome screen
pub fn is_start_trigger(text: &str) -> bool {
    let text = text.trim();

    // `/start`, `/start payload` and `/start@BotName`
    if let Some(rest) = text.strip_prefix("/start") {
        return rest.is_empty() || rest.starts_with(' ') || rest.starts_with('@');
    }

    let lowered = text.to_lowercase();
    TRIGGER_WORDS.contains(&lowered.as_str())
}

/// Send the welcome message with the main menu keyboard
pub async fn send_welcome(
    bot: &Bot,
    chat_id: ChatId,
    store: &Store,
    config: &BotConfig,
    telegram_id: i64,
    language_code: Option<&str>,
) -> Result<()> {
    let categories = store.list_categories().await?;

    let web_app = mini_app_url(&config.web_app_url, telegram_id);
    if web_app.is_none() {
        warn!(web_app_url = %config.web_app_url, "Mini app URL is invalid, omitting the shop button");
    }
    let support = config
        .support_url
        .as_deref()
        .and_then(|url| Url::parse(url).ok());

    let keyboard = create_main_menu_keyboard(web_app, support, language_code);

    bot.send_message(chat_id, format_welcome_message(&categories, language_code))
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;

    info!(user_id = %telegram_id, "Welcome message sent");
    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    store: Store,
    config: Arc<BotConfig>,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without sender");
        return Ok(());
    };

    let language_code = from.language_code.as_deref();
    let user = register_telegram_user(&store, from).await?;

    match msg.text() {
        Some(text) if is_start_trigger(text) => {
            debug!(user_id = %user.telegram_id, "Start requested");
            send_welcome(
                &bot,
                msg.chat.id,
                &store,
                &config,
                user.telegram_id,
                language_code,
            )
            .await?;
        }
        _ => {
            debug!(user_id = %user.telegram_id, "Unrecognized message, sending hint");
            bot.send_message(msg.chat.id, t_lang("text-hint", language_code))
                .await?;
        }
    }

    Ok(())
}
