//! UI Builder module for creating keyboards and formatting messages

use reqwest::Url;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use teloxide::utils::html;

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::models::{Ad, Category};

/// How many ads a bot list shows before collapsing the rest into "and N more"
pub const BOT_LIST_LIMIT: usize = 5;

/// Callback identifiers carried by the main menu buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    MyAds,
    Favorites,
    Help,
}

impl CallbackAction {
    /// Parse callback data; unknown data yields `None`
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "my_ads" => Some(Self::MyAds),
            "favorites" => Some(Self::Favorites),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MyAds => "my_ads",
            Self::Favorites => "favorites",
            Self::Help => "help",
        }
    }
}

/// Render a price without a trailing `.00` for whole amounts
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        format!("{price:.2}")
    }
}

/// Mini-app link for a user, or `None` if the configured base URL is unusable
pub fn mini_app_url(web_app_url: &str, telegram_id: i64) -> Option<Url> {
    let base = web_app_url.trim_end_matches('/');
    Url::parse(&format!("{base}/index.html?user_id={telegram_id}")).ok()
}

/// Create the main menu shown with the welcome message
pub fn create_main_menu_keyboard(
    web_app_url: Option<Url>,
    support_url: Option<Url>,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();

    if let Some(url) = web_app_url {
        rows.push(vec![InlineKeyboardButton::web_app(
            t_lang("button-open-shop", language_code),
            WebAppInfo { url },
        )]);
    }

    rows.push(vec![
        InlineKeyboardButton::callback(
            t_lang("button-my-ads", language_code),
            CallbackAction::MyAds.as_str(),
        ),
        InlineKeyboardButton::callback(
            t_lang("button-favorites", language_code),
            CallbackAction::Favorites.as_str(),
        ),
    ]);

    let mut last_row = vec![InlineKeyboardButton::callback(
        t_lang("button-help", language_code),
        CallbackAction::Help.as_str(),
    )];
    if let Some(url) = support_url {
        last_row.push(InlineKeyboardButton::url(
            t_lang("button-support", language_code),
            url,
        ));
    }
    rows.push(last_row);

    InlineKeyboardMarkup::new(rows)
}

/// Welcome text listing the features and categories
pub fn format_welcome_message(categories: &[Category], language_code: Option<&str>) -> String {
    let category_lines = categories
        .iter()
        .map(|category| format!("{} {}", category.emoji, html::escape(&category.name)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut sections = vec![
        t_lang("welcome-title", language_code),
        t_lang("welcome-features", language_code),
    ];
    if !category_lines.is_empty() {
        sections.push(format!(
            "{}\n{}",
            t_lang("welcome-categories-title", language_code),
            category_lines
        ));
    }
    sections.push(t_lang("welcome-open", language_code));

    sections.join("\n\n")
}

/// Help text, with the support contact when one is configured
pub fn format_help_message(support_url: Option<&str>, language_code: Option<&str>) -> String {
    let mut sections = vec![
        t_lang("help-title", language_code),
        t_lang("help-usage", language_code),
        t_lang("help-contact", language_code),
        t_lang("help-rules", language_code),
    ];
    if let Some(support) = support_url {
        sections.push(t_args_lang(
            "help-support",
            &[("support", &html::escape(support))],
            language_code,
        ));
    }

    sections.join("\n\n")
}

/// One list entry: title, price and view count
pub fn format_ad_entry(ad: &Ad, language_code: Option<&str>) -> String {
    format!(
        "• <b>{}</b> - {}\n  {}",
        html::escape(&ad.title),
        t_args_lang("ad-price", &[("price", &format_price(ad.price))], language_code),
        t_args_lang("ad-views", &[("views", &ad.views.to_string())], language_code)
    )
}

/// A titled list of at most [`BOT_LIST_LIMIT`] ads, with a footer
///
/// `total` is the full number of matching ads, which may exceed `ads.len()`
/// when the caller fetched only a page.
pub fn format_ad_list(
    title_key: &str,
    footer_key: &str,
    ads: &[Ad],
    total: usize,
    language_code: Option<&str>,
) -> String {
    let mut result = t_lang(title_key, language_code);
    result.push_str("\n\n");

    for ad in ads.iter().take(BOT_LIST_LIMIT) {
        result.push_str(&format_ad_entry(ad, language_code));
        result.push_str("\n\n");
    }

    let shown = ads.len().min(BOT_LIST_LIMIT);
    let total = total.max(ads.len());
    if total > shown {
        let remaining = (total - shown).to_string();
        result.push_str(&t_args_lang("list-more", &[("count", &remaining)], language_code));
        result.push('\n');
    }

    result.push('\n');
    result.push_str(&t_lang(footer_key, language_code));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(1500.0), "1500");
        assert_eq!(format_price(0.0), "0");
        assert_eq!(format_price(99.5), "99.50");
        assert_eq!(format_price(12.3456), "12.35");
    }

    #[test]
    fn test_callback_action_round_trip_names() {
        for action in [CallbackAction::MyAds, CallbackAction::Favorites, CallbackAction::Help] {
            assert_eq!(CallbackAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(CallbackAction::parse("delete_1"), None);
    }

    #[test]
    fn test_mini_app_url() {
        let url = mini_app_url("https://shop.example.com/", 42).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/index.html?user_id=42");
        assert!(mini_app_url("not a url", 42).is_none());
    }
}
