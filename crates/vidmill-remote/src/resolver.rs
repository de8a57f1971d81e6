//! Download-URL resolution service client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

/// Configuration for the resolver client.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Resolution endpoint URL
    pub api_url: String,
    /// API token sent in the request body
    pub api_token: String,
    /// Request timeout
    pub timeout: Duration,
}

impl ResolverConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("RESOLVER_API_URL")
                .unwrap_or_else(|_| "https://api.example.com/api/parseVideoUrl".to_string()),
            api_token: std::env::var("RESOLVER_API_TOKEN").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("RESOLVER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResolveRequest<'a> {
    url: &'a str,
    token: &'a str,
}

/// The resolver has shipped the download URL under several names over
/// time; all are declared here rather than sniffed at runtime.
#[derive(Debug, Deserialize)]
struct ResolveResponse {
    data: Option<ResolvePayload>,
    #[serde(flatten)]
    top: ResolvePayload,
}

#[derive(Debug, Default, Deserialize)]
struct ResolvePayload {
    url: Option<String>,
    download_url: Option<String>,
    video_url: Option<String>,
    #[serde(rename = "videoUrl")]
    video_url_camel: Option<String>,
}

impl ResolvePayload {
    fn download_url(&self) -> Option<&str> {
        [
            self.url.as_deref(),
            self.download_url.as_deref(),
            self.video_url.as_deref(),
            self.video_url_camel.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
    }
}

/// Client for the download-URL resolution service.
pub struct ResolverClient {
    http: Client,
    config: ResolverConfig,
}

impl ResolverClient {
    pub fn new(config: ResolverConfig) -> RemoteResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> RemoteResult<Self> {
        Self::new(ResolverConfig::from_env())
    }

    /// Resolve a source page URL to a direct download URL.
    pub async fn resolve(&self, source_url: &str) -> RemoteResult<String> {
        debug!(source_url, "Requesting download URL resolution");

        let response = self
            .http
            .post(&self.config.api_url)
            .json(&ResolveRequest {
                url: source_url,
                token: &self.config.api_token,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::request_failed(status, body));
        }

        let payload: ResolveResponse = response.json().await?;
        let url = payload
            .data
            .as_ref()
            .and_then(|d| d.download_url())
            .or_else(|| payload.top.download_url())
            .ok_or(RemoteError::MissingField("download URL"))?;

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ResolverClient {
        ResolverClient::new(ResolverConfig {
            api_url: format!("{}/api/parseVideoUrl", server.uri()),
            api_token: "tok".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_nested_data_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/parseVideoUrl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "url": "https://cdn.example.com/v.mp4" }
            })))
            .mount(&server)
            .await;

        let url = client_for(&server).await.resolve("https://page").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/v.mp4");
    }

    #[tokio::test]
    async fn test_resolve_top_level_alias() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/parseVideoUrl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "videoUrl": "https://cdn.example.com/alias.mp4"
            })))
            .mount(&server)
            .await;

        let url = client_for(&server).await.resolve("https://page").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/alias.mp4");
    }

    #[tokio::test]
    async fn test_resolve_missing_url_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/parseVideoUrl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.resolve("https://page").await.unwrap_err();
        assert!(matches!(err, RemoteError::MissingField(_)));
    }

    #[tokio::test]
    async fn test_resolve_server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/parseVideoUrl"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).await.resolve("https://page").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
