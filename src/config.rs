//! Configuration and settings management
//!
//! Settings are layered: config files, environment variables, then
//! command line flags.

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image upload endpoint of the Imgur API
pub const IMGUR_UPLOAD_ENDPOINT: &str = "https://api.imgur.com/3/image";
/// Long polling timeout for Telegram updates
pub const POLLING_TIMEOUT_SECS: u64 = 10;
/// Default timeout for a single upload request
pub const UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Application settings
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Telegram Bot API token
    #[serde(default)]
    pub telegram_token: String,
    /// Imgur application client ID
    #[serde(default)]
    pub imgur_client_id: String,
    /// Directory for downloaded photos
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,
    /// Description attached to every uploaded photo
    #[serde(default)]
    pub photo_description: String,
    /// Timeout for a single upload request, in seconds
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

fn default_tmp_dir() -> PathBuf {
    std::env::temp_dir()
}

const fn default_upload_timeout_secs() -> u64 {
    UPLOAD_TIMEOUT_SECS
}

/// Command line flags. Each one overrides the matching setting.
#[derive(Debug, Default, Parser)]
#[command(name = "imgur-uploader-bot", version, about = "The bot uploads photos to Imgur")]
pub struct Cli {
    /// Telegram bot token
    #[arg(short = 't', long = "token")]
    pub token: Option<String>,
    /// Imgur client id
    #[arg(short = 'c', long = "client-id")]
    pub client_id: Option<String>,
    /// Temporary folder to store photos
    #[arg(short = 'd', long = "tmp-dir")]
    pub tmp_dir: Option<PathBuf>,
    /// Description to uploaded photos
    #[arg(long = "desc-photo", visible_alias = "dp")]
    pub desc_photo: Option<String>,
}

/// Build the layered configuration source.
///
/// # Errors
///
/// Returns a `ConfigError` if a present config file cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg. `APP__TMP_DIR=/var/tmp/bot`
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain `TELEGRAM_TOKEN`, `IMGUR_CLIENT_ID`, ...; empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Load settings from config files and environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Load settings, apply command line overrides and validate the result.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required value is missing.
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let mut settings = Self::new()?;
        settings.apply_cli(cli);
        settings.validate()?;
        Ok(settings)
    }

    /// Override settings with the flags that were given
    pub fn apply_cli(&mut self, cli: Cli) {
        if let Some(token) = cli.token {
            self.telegram_token = token;
        }
        if let Some(client_id) = cli.client_id {
            self.imgur_client_id = client_id;
        }
        if let Some(tmp_dir) = cli.tmp_dir {
            self.tmp_dir = tmp_dir;
        }
        if let Some(description) = cli.desc_photo {
            self.photo_description = description;
        }
    }

    /// Check that the required credentials are present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` naming the first missing value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.trim().is_empty() {
            return Err(ConfigError::NotFound("telegram_token".to_string()));
        }
        if self.imgur_client_id.trim().is_empty() {
            return Err(ConfigError::NotFound("imgur_client_id".to_string()));
        }
        if self.upload_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "upload_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
