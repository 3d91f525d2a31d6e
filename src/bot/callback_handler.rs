//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

use crate::config::BotConfig;
use crate::db::Store;
use crate::models::{Ad, AdFilter};

// Import localization
use crate::localization::t_lang;

// Import UI builder functions
use super::register_telegram_user;
use super::ui_builder::{format_ad_list, format_help_message, CallbackAction, BOT_LIST_LIMIT};

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    store: Store,
    config: Arc<BotConfig>,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        // Stale or foreign buttons: just stop the loading spinner
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let language_code = q.from.language_code.as_deref();
    let chat_id: ChatId = q
        .message
        .as_ref()
        .map(|msg| msg.chat().id)
        .unwrap_or_else(|| q.from.id.into());

    match action {
        CallbackAction::MyAds => {
            let user = register_telegram_user(&store, &q.from).await?;
            let ads = store
                .list_ads(&AdFilter {
                    user_id: Some(user.id),
                    limit: Some(BOT_LIST_LIMIT as i64),
                    ..AdFilter::default()
                })
                .await?;
            let total = store.count_active_ads(user.id).await?;

            send_ad_list(
                &bot,
                &q,
                chat_id,
                &ads,
                usize::try_from(total).unwrap_or(ads.len()),
                ("my-ads-title", "my-ads-footer", "my-ads-empty"),
                language_code,
            )
            .await?;
        }
        CallbackAction::Favorites => {
            let user = register_telegram_user(&store, &q.from).await?;
            let favorites = store.get_user_favorites(user.id).await?;

            send_ad_list(
                &bot,
                &q,
                chat_id,
                &favorites,
                favorites.len(),
                ("favorites-title", "favorites-footer", "favorites-empty"),
                language_code,
            )
            .await?;
        }
        CallbackAction::Help => {
            bot.send_message(
                chat_id,
                format_help_message(config.support_url.as_deref(), language_code),
            )
            .parse_mode(ParseMode::Html)
            .await?;
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }

    Ok(())
}

/// Send a short ad list, or a transient alert when there is nothing to show
async fn send_ad_list(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    ads: &[Ad],
    total: usize,
    (title_key, footer_key, empty_key): (&str, &str, &str),
    language_code: Option<&str>,
) -> Result<()> {
    if ads.is_empty() {
        bot.answer_callback_query(q.id.clone())
            .text(t_lang(empty_key, language_code))
            .show_alert(true)
            .await?;
        return Ok(());
    }

    bot.send_message(
        chat_id,
        format_ad_list(title_key, footer_key, ads, total, language_code),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    bot.answer_callback_query(q.id.clone()).await?;

    debug!(user_id = %q.from.id, shown = ads.len(), total, "Ad list sent");
    Ok(())
}
