use std::sync::Arc;

use bot_core::Controller;
use shared::error::BotError;
use storage::Storage;
use teloxide::Bot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod telegram;

use config::{load_settings, prepare_database_url};
use telegram::TelegramTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    for key in settings.missing() {
        error!(setting = key, "no {key} variable found in project environment");
    }
    let Some(bot_token) = settings.bot_token.clone() else {
        return Err(BotError::Config("BOT_TOKEN is required to reach the chat platform".into()).into());
    };

    let database_url = prepare_database_url(settings.database_url());
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    storage.health_check().await?;

    let bot = Bot::new(bot_token);
    let controller = Controller::new(storage, TelegramTransport::new(bot.clone()))
        .with_operator(settings.admin_id);

    info!(operator = ?settings.admin_id, "bot polling for updates");
    telegram::run(bot, Arc::new(controller)).await;
    info!("bot stopped");
    Ok(())
}
