use crate::relay::{PhotoEvent, UploadRelay};
use std::sync::Arc;
use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::warn;

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Start the bot and show usage
    #[command(description = "Start the bot.")]
    Start,
    /// Show usage
    #[command(description = "Show how to use the bot.")]
    Help,
}

/// Build a photo event from a message, picking the largest photo size.
#[must_use]
pub fn photo_event(msg: &Message) -> Option<PhotoEvent> {
    let photo = msg.photo()?.last()?;
    Some(PhotoEvent {
        recipient: msg.chat.id.0,
        file_id: photo.file.id.0.clone(),
    })
}

/// Command handler
///
/// # Errors
///
/// Never fails; reply errors are logged by the relay.
pub async fn handle_command(
    msg: Message,
    cmd: Command,
    relay: Arc<UploadRelay>,
) -> Result<(), teloxide::RequestError> {
    match cmd {
        Command::Start => relay.handle_start(msg.chat.id.0).await,
        Command::Help => relay.handle_help(msg.chat.id.0).await,
    }
    respond(())
}

/// Photo message handler
///
/// # Errors
///
/// Never fails; every per-photo error ends in a reply to the user.
pub async fn handle_photo(
    msg: Message,
    relay: Arc<UploadRelay>,
) -> Result<(), teloxide::RequestError> {
    match photo_event(&msg) {
        Some(event) => relay.handle_photo(event).await,
        None => warn!(chat_id = msg.chat.id.0, "Photo message without photo sizes"),
    }
    respond(())
}

/// Text message handler
///
/// # Errors
///
/// Never fails; reply errors are logged by the relay.
pub async fn handle_text(
    msg: Message,
    relay: Arc<UploadRelay>,
) -> Result<(), teloxide::RequestError> {
    relay.handle_text(msg.chat.id.0).await;
    respond(())
}
