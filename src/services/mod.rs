//! Clients for the third-party services the backend depends on, and the
//! clothing intake pipeline that chains them.
//!
//! Each client sits behind a trait so request handlers receive an injected
//! handle and tests can substitute doubles.

pub mod background;
pub mod intake;
pub mod mailer;
pub mod openai;
pub mod storage;
pub mod weather;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::models::clothing::ClothingClassification;
use weather::WeatherReport;

/// Applied to every outbound HTTP client; nothing is retried.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {service}: {detail}")]
    Malformed {
        service: &'static str,
        detail: String,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("email error: {0}")]
    Email(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub(crate) fn http_client() -> Result<reqwest::Client, ServiceError> {
    Ok(reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?)
}

/// Turns a non-2xx response into [`ServiceError::Status`].
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Returns the image with its background stripped, as PNG bytes.
    async fn remove_background(&self, image: &[u8], file_name: &str) -> Result<Vec<u8>, ServiceError>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists the file at `source` under `key` and returns its stable URL.
    async fn store(&self, key: &str, source: &Path, content_type: &str) -> Result<String, ServiceError>;
    async fn delete(&self, key: &str) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait ClothingClassifier: Send + Sync {
    async fn classify(&self, image: &[u8], mime_type: &str) -> Result<ClothingClassification, ServiceError>;
}

#[async_trait]
pub trait OutfitStylist: Send + Sync {
    /// Picks clothing ids from `inventory` (one line per item) for `request`.
    async fn suggest_outfit(&self, request: &str, inventory: &[String]) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherReport, ServiceError>;
}
