use crate::bot::handlers::{handle_command, handle_photo, handle_text, Command};
use crate::bot::TelegramPhotoSource;
use crate::config::{Settings, POLLING_TIMEOUT_SECS};
use crate::imgur::ImgurClient;
use crate::relay::UploadRelay;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tracing::info;

/// Run the bot until it is stopped with Ctrl+C.
///
/// # Errors
///
/// Returns an error if the Telegram Bot API is unreachable with the given
/// token or the temp directory cannot be created.
pub async fn run_bot(settings: Arc<Settings>) -> Result<()> {
    let bot = Bot::new(settings.telegram_token.clone());

    let me = bot
        .get_me()
        .await
        .context("Cannot connect to the Telegram Bot API")?;
    info!(username = %me.username(), "Connected to Telegram.");

    prepare_tmp_dir(&settings.tmp_dir).await?;

    let relay = init_relay(&bot, &settings);
    let handler = setup_handler();
    let listener = Polling::builder(bot.clone())
        .timeout(Duration::from_secs(POLLING_TIMEOUT_SECS))
        .build();

    info!("Imgur Uploader Bot is started");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay])
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    Ok(())
}

async fn prepare_tmp_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Cannot create temp directory {}", dir.display()))?;
    info!(tmp_dir = %dir.display(), "Temp directory ready.");
    Ok(())
}

fn init_relay(bot: &Bot, settings: &Settings) -> Arc<UploadRelay> {
    let source = Arc::new(TelegramPhotoSource::new(bot.clone()));
    let uploader = Arc::new(ImgurClient::new(settings));
    info!("Imgur client initialized.");
    Arc::new(UploadRelay::new(source, uploader, settings.tmp_dir.clone()))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(handle_photo))
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text))
}
