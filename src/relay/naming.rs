//! Temp file naming.

use sha1::{Digest, Sha1};
use std::ffi::OsStr;
use std::path::Path;

/// Builds the local file name for a downloaded photo.
///
/// The stem is the hex SHA-1 of the platform file identifier, so the same
/// file always lands on the same name and concurrent events for different
/// files never share one. The extension is copied from the remote path.
///
/// # Examples
///
/// ```
/// use imgur_uploader_bot::relay::temp_file_name;
///
/// let name = temp_file_name("abc", "photos/file_0.jpg");
/// assert_eq!(name, "a9993e364706816aba3e25717850c26c9cd0d89d.jpg");
/// ```
#[must_use]
pub fn temp_file_name(file_id: &str, remote_path: &str) -> String {
    let digest = Sha1::digest(file_id.as_bytes());
    let extension = Path::new(remote_path)
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("{digest:x}{extension}")
}
