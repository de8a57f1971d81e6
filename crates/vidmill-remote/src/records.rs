//! Tabular database record update client.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

/// Configuration for the record update client.
#[derive(Debug, Clone)]
pub struct RecordClientConfig {
    /// Database API base URL
    pub base_url: String,
    /// API token sent in the `xc-token` header
    pub api_token: String,
    /// Column written with the public URL
    pub update_field_name: String,
    /// Request timeout
    pub timeout: Duration,
}

impl RecordClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("RECORDS_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            api_token: std::env::var("RECORDS_API_TOKEN").unwrap_or_default(),
            update_field_name: std::env::var("RECORDS_UPDATE_FIELD")
                .unwrap_or_else(|_| "final_url".to_string()),
            timeout: Duration::from_secs(
                std::env::var("RECORDS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}

/// Client for the tabular database update API.
pub struct RecordClient {
    http: Client,
    config: RecordClientConfig,
}

impl RecordClient {
    pub fn new(config: RecordClientConfig) -> RemoteResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> RemoteResult<Self> {
        Self::new(RecordClientConfig::from_env())
    }

    /// Field the public URL is written to.
    pub fn update_field_name(&self) -> &str {
        &self.config.update_field_name
    }

    /// Write `public_url` back to the originating row.
    pub async fn update_public_url(
        &self,
        table_id: &str,
        record_id: i64,
        public_url: &str,
    ) -> RemoteResult<()> {
        let endpoint = format!(
            "{}/api/v2/tables/{}/records",
            self.config.base_url.trim_end_matches('/'),
            table_id
        );

        debug!(table_id, record_id, field = %self.config.update_field_name, "Updating record");

        let payload = json!([{
            "Id": record_id,
            self.config.update_field_name.as_str(): public_url,
        }]);

        let response = self
            .http
            .patch(&endpoint)
            .header("xc-token", &self.config.api_token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::request_failed(status, body));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> RecordClient {
        RecordClient::new(RecordClientConfig {
            base_url: server.uri(),
            api_token: "tok".to_string(),
            update_field_name: "final_url".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_update_patches_record() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/v2/tables/T1/records"))
            .and(header("xc-token", "tok"))
            .and(body_partial_json(serde_json::json!([
                { "Id": 7, "final_url": "https://media.example.com/a/out.mp4" }
            ])))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        client_for(&server)
            .await
            .update_public_url("T1", 7, "https://media.example.com/a/out.mp4")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_non_200_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/v2/tables/T1/records"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad field"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .update_public_url("T1", 7, "https://u.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::RequestFailed { status: 422, .. }));
    }
}
