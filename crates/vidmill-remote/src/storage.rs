//! Object-storage upload client.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{RemoteError, RemoteResult};

/// Configuration for the storage upload client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage service base URL
    pub base_url: String,
    /// API key sent in the `X-API-Key` header
    pub api_key: String,
    /// Expiration interval assigned to uploads (service-defined syntax)
    pub expiration_interval: String,
    /// Optional album the upload is filed under
    pub album_id: String,
    /// Upload request timeout
    pub timeout: Duration,
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("STORAGE_BASE_URL")
                .unwrap_or_else(|_| "https://media.example.com".to_string()),
            api_key: std::env::var("STORAGE_API_KEY").unwrap_or_default(),
            expiration_interval: std::env::var("STORAGE_EXPIRATION")
                .unwrap_or_else(|_| "P30D".to_string()),
            album_id: std::env::var("STORAGE_ALBUM_ID").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("STORAGE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

/// A successfully uploaded object.
#[derive(Debug, Clone)]
pub struct UploadedObject {
    /// Public direct-file URL
    pub public_url: String,
    /// Expiry timestamp as reported by the service, if any
    pub expiration_date_gmt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    image: Option<UploadedImage>,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    url: Option<String>,
    expiration_date_gmt: Option<String>,
}

/// Client for the object-storage upload service.
pub struct StorageClient {
    http: Client,
    config: StorageConfig,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> RemoteResult<Self> {
        if config.album_id.trim().is_empty() {
            warn!("STORAGE_ALBUM_ID is not set; uploads won't be filed under an album");
        }
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> RemoteResult<Self> {
        Self::new(StorageConfig::from_env())
    }

    /// Upload a video file, returning its public URL.
    ///
    /// The service stores mp4 uploads as direct files; a response URL
    /// without an `.mp4` extension means something else came back and is
    /// rejected rather than propagated downstream.
    pub async fn upload_video(
        &self,
        local_path: impl AsRef<Path>,
        title: &str,
    ) -> RemoteResult<UploadedObject> {
        let local_path = local_path.as_ref();
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.mp4".to_string());

        debug!(path = %local_path.display(), title, "Uploading video");

        let bytes = tokio::fs::read(local_path).await?;
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(RemoteError::Network)?;

        let mut form = multipart::Form::new()
            .text("format", "json")
            .text("title", title.to_string())
            .text("expiration", self.config.expiration_interval.clone())
            .part("source", part);
        if !self.config.album_id.trim().is_empty() {
            form = form.text("album_id", self.config.album_id.trim().to_string());
        }

        let url = format!("{}/api/1/upload", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("X-API-Key", &self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::request_failed(status, body));
        }

        let payload: UploadResponse = response.json().await?;
        let image = payload.image.ok_or(RemoteError::MissingField("image"))?;
        let public_url = image
            .url
            .filter(|u| !u.is_empty())
            .ok_or(RemoteError::MissingField("image.url"))?;

        if !public_url.to_lowercase().contains(".mp4") {
            return Err(RemoteError::NotAnMp4Url(public_url));
        }

        Ok(UploadedObject {
            public_url,
            expiration_date_gmt: image.expiration_date_gmt,
        })
    }
}
