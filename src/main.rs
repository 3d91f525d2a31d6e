use anyhow::Result;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use marketplace::config::{Config, LogFormat};
use marketplace::db::Store;
use marketplace::{bot, localization, web};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("marketplace=info,tower_http=info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!("Starting Marketplace Telegram Bot");

    localization::init_localization()?;

    // One store shared by the bot and the web server
    let store = Store::connect(&config.database_url).await?;

    // Bind before polling starts so a bad address fails startup
    let listener = web::bind(&config.web).await?;

    // Web server runs alongside the bot's polling loop
    let web_store = store.clone();
    let web_config = config.web.clone();
    tokio::spawn(async move {
        if let Err(e) = web::serve(listener, web_store, web_config).await {
            error!(error = ?e, "Web server failed");
        }
    });

    let bot = Bot::new(config.bot_token.clone());
    bot::run(bot, store, config.bot).await;

    info!("Bot stopped");
    Ok(())
}
