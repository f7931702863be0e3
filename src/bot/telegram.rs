//! Telegram side of the relay: file lookup, download and replies.

use crate::relay::{PhotoSource, RelayError, RemoteFile};
use async_trait::async_trait;
use std::path::Path;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// [`PhotoSource`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramPhotoSource {
    bot: Bot,
}

impl TelegramPhotoSource {
    /// Wrap a bot instance
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl PhotoSource for TelegramPhotoSource {
    async fn resolve_file(&self, file_id: &str) -> Result<RemoteFile, RelayError> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(|e| RelayError::Transport(format!("Telegram getFile error: {e}")))?;

        debug!(file_id, path = %file.path, size = file.size, "File resolved");

        let id = file.id.0.clone();
        Ok(RemoteFile {
            id,
            path: file.path,
        })
    }

    async fn download(&self, file: &RemoteFile, destination: &Path) -> Result<(), RelayError> {
        let mut dst = tokio::fs::File::create(destination).await?;
        self.bot
            .download_file(&file.path, &mut dst)
            .await
            .map_err(|e| RelayError::Transport(format!("Telegram download error: {e}")))?;
        dst.flush().await?;
        Ok(())
    }

    async fn send_text(&self, recipient: i64, text: &str) -> Result<(), RelayError> {
        self.bot
            .send_message(ChatId(recipient), text)
            .await
            .map(|_| ())
            .map_err(|e| RelayError::Transport(format!("Telegram send error: {e}")))
    }
}
