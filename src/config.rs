//! # Application Configuration
//!
//! Settings for the bot, the web server and the store, read from the
//! environment (optionally pre-filled from a `.env` file).

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

// Defaults used when a variable is not set
pub const DEFAULT_WEB_APP_URL: &str = "http://localhost:8080";
pub const DEFAULT_WEB_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_WEB_SERVER_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://marketplace.db";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_PHOTO_PLACEHOLDER_URL: &str =
    "https://via.placeholder.com/400x300/7B1FA2/FFFFFF?text=Marketplace+Photo";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings the bot front-end needs at runtime
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    /// Externally reachable base URL of the mini-app
    pub web_app_url: String,
    /// Optional support link shown in the welcome keyboard
    pub support_url: Option<String>,
}

/// Settings the web front-end needs at runtime
#[derive(Debug, Clone, PartialEq)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `index.html` and the mini-app assets
    pub static_dir: PathBuf,
    /// URL handed out by the photo upload stub
    pub photo_placeholder_url: String,
}

/// Full application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    pub log_format: LogFormat,
    pub bot: BotConfig,
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("BOT_TOKEN").ok_or_else(|| anyhow!("BOT_TOKEN must be set"))?;

        let port = match get("WEB_SERVER_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("WEB_SERVER_PORT is not a valid port: {raw}"))?,
            None => DEFAULT_WEB_SERVER_PORT,
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            bot_token,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            log_format,
            bot: BotConfig {
                web_app_url: get("WEB_APP_URL")
                    .unwrap_or_else(|| DEFAULT_WEB_APP_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                support_url: get("SUPPORT_URL"),
            },
            web: WebConfig {
                host: get("WEB_SERVER_HOST")
                    .unwrap_or_else(|| DEFAULT_WEB_SERVER_HOST.to_string()),
                port,
                static_dir: get("STATIC_DIR")
                    .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
                    .into(),
                photo_placeholder_url: get("PHOTO_PLACEHOLDER_URL")
                    .unwrap_or_else(|| DEFAULT_PHOTO_PLACEHOLDER_URL.to_string()),
            },
        })
    }
}

impl WebConfig {
    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_token() {
        let config = Config::from_lookup(lookup_from(&[("BOT_TOKEN", "123:abc")])).unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.bot.web_app_url, DEFAULT_WEB_APP_URL);
        assert_eq!(config.bot.support_url, None);
        assert_eq!(config.web.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.web.static_dir, PathBuf::from(DEFAULT_STATIC_DIR));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("BOT_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("WEB_APP_URL", "https://shop.example.com/"),
            ("WEB_SERVER_HOST", "127.0.0.1"),
            ("WEB_SERVER_PORT", "3000"),
            ("DATABASE_URL", "sqlite://other.db"),
            ("SUPPORT_URL", "https://t.me/support"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.bot.web_app_url, "https://shop.example.com");
        assert_eq!(config.bot.support_url.as_deref(), Some("https://t.me/support"));
        assert_eq!(config.web.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.database_url, "sqlite://other.db");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let result = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "t"),
            ("WEB_SERVER_PORT", "eighty"),
        ]));
        assert!(result.is_err());
    }
}
