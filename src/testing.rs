//! Testing helpers and mock utilities.
//!
//! Provides convenient constructors for mocked platform and image host
//! collaborators.

use crate::relay::{MockImageUploader, MockPhotoSource, RelayError, RemoteFile, UploadOutcome};
use std::sync::{Arc, Mutex};

/// Replies captured by [`record_replies`], as `(recipient, text)` pairs.
pub type Replies = Arc<Mutex<Vec<(i64, String)>>>;

/// Create a mock platform that resolves every file id to `remote_path` and
/// writes `bytes` to the requested destination on download.
///
/// `send_text` has no expectation; pair with [`record_replies`] or set one.
#[must_use]
pub fn mock_source_with_photo(remote_path: &'static str, bytes: &'static [u8]) -> MockPhotoSource {
    let mut mock = MockPhotoSource::new();

    mock.expect_resolve_file().returning(move |file_id| {
        Ok(RemoteFile {
            id: file_id.to_string(),
            path: remote_path.to_string(),
        })
    });

    mock.expect_download().returning(move |_, destination| {
        std::fs::write(destination, bytes).map_err(RelayError::from)
    });

    mock
}

/// Capture every `send_text` call on the mock in order.
pub fn record_replies(mock: &mut MockPhotoSource) -> Replies {
    let replies: Replies = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&replies);

    mock.expect_send_text().returning(move |recipient, text| {
        sink.lock()
            .map_err(|e| RelayError::Transport(e.to_string()))?
            .push((recipient, text.to_string()));
        Ok(())
    });

    replies
}

/// Create a mock image host that answers every upload with `outcome`.
#[must_use]
pub fn mock_uploader_returning(outcome: UploadOutcome) -> MockImageUploader {
    let mut mock = MockImageUploader::new();
    mock.expect_upload()
        .times(1)
        .returning(move |_| Ok(outcome.clone()));
    mock
}
