/// Command and message handlers
pub mod handlers;
/// Telegram implementation of the photo source
pub mod telegram;

pub use telegram::TelegramPhotoSource;
