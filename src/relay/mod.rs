//! Photo upload relay.
//!
//! Takes one photo event through the whole cycle: resolve the file on the
//! messaging platform, download it into the temp directory, push it to the
//! image host and report the result back to the sender.

mod naming;

pub use naming::temp_file_name;

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Usage hint sent for text messages and commands.
pub const HOW_TO_USE: &str = "Just send a photo to me.";
/// Generic failure reply. Never carries upstream details.
pub const SOMETHING_WENT_WRONG: &str = "Sorry, but something went wrong. Try again later.";
/// Acknowledgment sent once the photo is stored locally.
pub const GOT_PHOTO: &str = "Okay. We have got your photo. Wait, please.";
/// Confirmation sent right before the hosted link.
pub const PHOTO_UPLOADED: &str = "Your photo was successfully uploaded to Imgur.";

/// Errors that can occur while relaying a photo
#[derive(Debug, Error)]
pub enum RelayError {
    /// Messaging platform or HTTP transport failure
    #[error("Transport error: {0}")]
    Transport(String),
    /// The image host answered with a non-success status
    #[error("Upload rejected: {0}")]
    Rejected(String),
    /// Unexpected or malformed response body
    #[error("Parse error: {0}")]
    Parse(String),
    /// Local file system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A photo notification received from the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoEvent {
    /// Chat the replies go to
    pub recipient: i64,
    /// Platform file identifier of the photo
    pub file_id: String,
}

/// A file reference resolved by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Platform file identifier
    pub id: String,
    /// Path on the platform's file storage, used for downloading
    pub path: String,
}

/// Result of an upload attempt that reached the image host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Public link of the hosted image
    Hosted(String),
    /// Error message reported by the image host
    Failed(String),
}

/// Messaging platform operations the relay depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Look up a file by its identifier
    async fn resolve_file(&self, file_id: &str) -> Result<RemoteFile, RelayError>;
    /// Download a resolved file to `destination`
    async fn download(&self, file: &RemoteFile, destination: &Path) -> Result<(), RelayError>;
    /// Send a plain text message
    async fn send_text(&self, recipient: i64, text: &str) -> Result<(), RelayError>;
}

/// Image hosting operations the relay depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload raw image bytes
    async fn upload(&self, image: Vec<u8>) -> Result<UploadOutcome, RelayError>;
}

/// Orchestrates photo events end to end.
///
/// Holds no per-event state, so one instance is shared by every handler.
pub struct UploadRelay {
    source: Arc<dyn PhotoSource>,
    uploader: Arc<dyn ImageUploader>,
    tmp_dir: PathBuf,
}

impl UploadRelay {
    /// Create a relay writing temp files into `tmp_dir`
    #[must_use]
    pub fn new(
        source: Arc<dyn PhotoSource>,
        uploader: Arc<dyn ImageUploader>,
        tmp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            uploader,
            tmp_dir: tmp_dir.into(),
        }
    }

    /// Local path for a resolved remote file
    #[must_use]
    pub fn temp_path(&self, file: &RemoteFile) -> PathBuf {
        self.tmp_dir.join(temp_file_name(&file.id, &file.path))
    }

    /// Handle a photo event.
    ///
    /// Every failure ends with the generic reply; details only go to the log.
    /// Once a download has been attempted the temp file is removed on every
    /// path, best-effort.
    pub async fn handle_photo(&self, event: PhotoEvent) {
        let recipient = event.recipient;
        info!(recipient, file_id = %event.file_id, "Photo received");

        let file = match self.source.resolve_file(&event.file_id).await {
            Ok(file) => file,
            Err(e) => {
                error!(recipient, error = %e, "Cannot get a file by its ID");
                self.reply(recipient, SOMETHING_WENT_WRONG).await;
                return;
            }
        };

        let path = self.temp_path(&file);
        debug!(recipient, path = %path.display(), "Downloading photo");

        if let Err(e) = self.source.download(&file, &path).await {
            error!(recipient, error = %e, "Cannot download a file");
            self.reply(recipient, SOMETHING_WENT_WRONG).await;
            remove_temp_file(&path).await;
            return;
        }

        self.reply(recipient, GOT_PHOTO).await;

        match self.upload(&path).await {
            Ok(link) => {
                self.reply(recipient, PHOTO_UPLOADED).await;
                self.reply(recipient, &link).await;
                info!(recipient, link = %link, "A photo was uploaded");
            }
            Err(e) => {
                error!(recipient, error = %e, "Cannot upload a photo");
                self.reply(recipient, SOMETHING_WENT_WRONG).await;
            }
        }

        remove_temp_file(&path).await;
    }

    /// Handle a plain text message
    pub async fn handle_text(&self, recipient: i64) {
        debug!(recipient, "Text message received");
        self.reply(recipient, HOW_TO_USE).await;
    }

    /// Handle the `/start` command
    pub async fn handle_start(&self, recipient: i64) {
        info!(recipient, "Start command received");
        self.reply(recipient, HOW_TO_USE).await;
    }

    /// Handle the `/help` command
    pub async fn handle_help(&self, recipient: i64) {
        debug!(recipient, "Help command received");
        self.reply(recipient, HOW_TO_USE).await;
    }

    async fn upload(&self, path: &Path) -> Result<String, RelayError> {
        let image = tokio::fs::read(path).await?;
        debug!(bytes = image.len(), "Uploading photo");

        match self.uploader.upload(image).await? {
            UploadOutcome::Hosted(link) => Ok(link),
            UploadOutcome::Failed(message) => Err(RelayError::Rejected(message)),
        }
    }

    async fn reply(&self, recipient: i64, text: &str) {
        if let Err(e) = self.source.send_text(recipient, text).await {
            warn!(recipient, error = %e, "Failed to send a reply");
        }
    }
}

async fn remove_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Temp file removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Temp file already gone");
        }
        Err(e) => warn!(path = %path.display(), error = %e, "Cannot delete a temp file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{mock_source_with_photo, mock_uploader_returning, record_replies};

    fn relay(source: MockPhotoSource, uploader: MockImageUploader, dir: &Path) -> UploadRelay {
        UploadRelay::new(Arc::new(source), Arc::new(uploader), dir)
    }

    fn event() -> PhotoEvent {
        PhotoEvent {
            recipient: 42,
            file_id: "AgACAgIAAxkBAAIB".to_string(),
        }
    }

    #[tokio::test]
    async fn success_sends_ack_confirmation_and_link() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut source = mock_source_with_photo("photos/file_1.jpg", b"jpeg bytes");
        let replies = record_replies(&mut source);
        let uploader =
            mock_uploader_returning(UploadOutcome::Hosted("https://i.imgur.com/abc.png".into()));

        relay(source, uploader, dir.path()).handle_photo(event()).await;

        let replies = replies.lock().map_err(|e| e.to_string())?.clone();
        assert_eq!(
            replies,
            vec![
                (42, GOT_PHOTO.to_string()),
                (42, PHOTO_UPLOADED.to_string()),
                (42, "https://i.imgur.com/abc.png".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn rejection_detail_is_not_shown_to_user() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut source = mock_source_with_photo("photos/file_1.jpg", b"jpeg bytes");
        let replies = record_replies(&mut source);
        let uploader = mock_uploader_returning(UploadOutcome::Failed("rate limited".into()));

        relay(source, uploader, dir.path()).handle_photo(event()).await;

        let replies = replies.lock().map_err(|e| e.to_string())?.clone();
        assert_eq!(
            replies,
            vec![
                (42, GOT_PHOTO.to_string()),
                (42, SOMETHING_WENT_WRONG.to_string()),
            ]
        );
        assert!(replies.iter().all(|(_, text)| !text.contains("rate limited")));
        Ok(())
    }

    #[tokio::test]
    async fn resolve_failure_skips_download_and_upload() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let mut source = MockPhotoSource::new();
        source
            .expect_resolve_file()
            .returning(|_| Err(RelayError::Transport("timed out".into())));
        source.expect_download().times(0);
        let replies = record_replies(&mut source);
        let mut uploader = MockImageUploader::new();
        uploader.expect_upload().times(0);

        relay(source, uploader, dir.path()).handle_photo(event()).await;

        let replies = replies.lock().map_err(|e| e.to_string())?.clone();
        assert_eq!(replies, vec![(42, SOMETHING_WENT_WRONG.to_string())]);
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_temp_file_reports_generic_error() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let mut source = MockPhotoSource::new();
        source.expect_resolve_file().returning(|id| {
            Ok(RemoteFile {
                id: id.to_string(),
                path: "photos/file_1.jpg".to_string(),
            })
        });
        // Reports success without writing anything.
        source.expect_download().returning(|_, _| Ok(()));
        let replies = record_replies(&mut source);
        let mut uploader = MockImageUploader::new();
        uploader.expect_upload().times(0);

        relay(source, uploader, dir.path()).handle_photo(event()).await;

        let replies = replies.lock().map_err(|e| e.to_string())?.clone();
        assert_eq!(
            replies,
            vec![
                (42, GOT_PHOTO.to_string()),
                (42, SOMETHING_WENT_WRONG.to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn temp_file_is_removed_after_upload() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut source = mock_source_with_photo("photos/file_1.jpg", b"jpeg bytes");
        let _replies = record_replies(&mut source);
        let uploader =
            mock_uploader_returning(UploadOutcome::Hosted("https://i.imgur.com/x.jpg".into()));

        let relay = relay(source, uploader, dir.path());
        let expected = relay.temp_path(&RemoteFile {
            id: event().file_id,
            path: "photos/file_1.jpg".to_string(),
        });
        relay.handle_photo(event()).await;

        assert!(!expected.exists());
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn failed_send_does_not_abort_pipeline() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut source = mock_source_with_photo("photos/file_1.jpg", b"jpeg bytes");
        source
            .expect_send_text()
            .times(3)
            .returning(|_, _| Err(RelayError::Transport("blocked by user".into())));
        let mut uploader = MockImageUploader::new();
        uploader
            .expect_upload()
            .times(1)
            .returning(|_| Ok(UploadOutcome::Hosted("https://i.imgur.com/x.jpg".into())));

        relay(source, uploader, dir.path()).handle_photo(event()).await;

        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn text_and_start_reply_with_usage() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut source = MockPhotoSource::new();
        let replies = record_replies(&mut source);
        let relay = relay(source, MockImageUploader::new(), dir.path());

        relay.handle_text(7).await;
        relay.handle_start(8).await;
        relay.handle_help(9).await;

        let replies = replies.lock().map_err(|e| e.to_string())?.clone();
        assert_eq!(
            replies,
            vec![
                (7, HOW_TO_USE.to_string()),
                (8, HOW_TO_USE.to_string()),
                (9, HOW_TO_USE.to_string()),
            ]
        );
        Ok(())
    }
}
