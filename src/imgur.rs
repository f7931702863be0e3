//! Imgur image host client
//!
//! Uploads images anonymously with an application client ID. The image is
//! sent base64-encoded in a form body; the JSON answer carries either
//! `data.link` or `data.error`.

use crate::config::{Settings, IMGUR_UPLOAD_ENDPOINT};
use crate::relay::{ImageUploader, RelayError, UploadOutcome};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::AUTHORIZATION;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const LINK_PATH: &[&str] = &["data", "link"];
const ERROR_PATH: &[&str] = &["data", "error"];

/// Creates an HTTP client with the given request timeout.
#[must_use]
pub fn create_http_client(timeout_secs: u64) -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

/// Extracts a string from a JSON value by navigating a key path.
///
/// # Example
/// ```
/// use imgur_uploader_bot::imgur::extract_text_content;
/// use serde_json::json;
///
/// let body = json!({ "data": { "link": "https://i.imgur.com/abc.png" } });
/// let link = extract_text_content(&body, &["data", "link"])?;
/// assert_eq!(link, "https://i.imgur.com/abc.png");
/// # Ok::<(), imgur_uploader_bot::relay::RelayError>(())
/// ```
///
/// # Errors
///
/// Returns `RelayError::Parse` if a key is missing or the target is not a string.
pub fn extract_text_content(value: &Value, path: &[&str]) -> Result<String, RelayError> {
    let mut current = value;

    for segment in path {
        current = current
            .get(*segment)
            .ok_or_else(|| RelayError::Parse(format!("Invalid path: missing key {segment}")))?;
    }

    current
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| RelayError::Parse(format!("Expected string at path, got: {current:?}")))
}

/// Imgur upload client
pub struct ImgurClient {
    http: HttpClient,
    endpoint: String,
    client_id: String,
    description: String,
}

impl ImgurClient {
    /// Create a client for the public Imgur API
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: create_http_client(settings.upload_timeout_secs),
            endpoint: IMGUR_UPLOAD_ENDPOINT.to_string(),
            client_id: settings.imgur_client_id.clone(),
            description: settings.photo_description.clone(),
        }
    }

    /// Point the client at another upload endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ImageUploader for ImgurClient {
    async fn upload(&self, image: Vec<u8>) -> Result<UploadOutcome, RelayError> {
        let encoded = STANDARD.encode(&image);
        let params = [
            ("image", encoded.as_str()),
            ("description", self.description.as_str()),
        ];

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Client-ID {}", self.client_id))
            .form(&params)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .map_err(|e| RelayError::Parse(e.to_string()))
                .and_then(|json| extract_text_content(&json, ERROR_PATH))
                .unwrap_or_else(|e| {
                    debug!(error = %e, "Cannot get an error from Imgur response");
                    status.to_string()
                });
            warn!(status = %status, message = %message, "Imgur rejected the upload");
            return Ok(UploadOutcome::Failed(message));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| RelayError::Parse(e.to_string()))?;

        extract_text_content(&json, LINK_PATH).map(UploadOutcome::Hosted)
    }
}
