//! Text-to-speech service client.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

/// Status code the TTS service returns on success.
const TTS_STATUS_OK: i64 = 1001;

/// Configuration for the TTS client.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Synthesis endpoint URL
    pub api_url: String,
    /// API token sent as a query parameter
    pub api_token: String,
    /// Voice selector passed through to the service
    pub voice: String,
    /// Request timeout
    pub timeout: Duration,
}

impl TtsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("TTS_API_URL")
                .unwrap_or_else(|_| "https://tts.example.com/textToVoice".to_string()),
            api_token: std::env::var("TTS_API_TOKEN").unwrap_or_default(),
            voice: std::env::var("TTS_VOICE").unwrap_or_else(|_| "2".to_string()),
            timeout: Duration::from_secs(
                std::env::var("TTS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    status: i64,
    info: Option<String>,
    #[serde(rename = "voiceUrl")]
    voice_url: Option<String>,
}

/// Client for the text-to-speech service.
pub struct TtsClient {
    http: Client,
    config: TtsConfig,
}

impl TtsClient {
    pub fn new(config: TtsConfig) -> RemoteResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> RemoteResult<Self> {
        Self::new(TtsConfig::from_env())
    }

    /// Synthesize speech for `text`, returning the audio URL to fetch.
    pub async fn synthesize(&self, text: &str) -> RemoteResult<String> {
        debug!(chars = text.chars().count(), "Requesting speech synthesis");

        let response = self
            .http
            .get(&self.config.api_url)
            .query(&[
                ("text", text),
                ("sex", self.config.voice.as_str()),
                ("token", self.config.api_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::request_failed(status, body));
        }

        let payload: TtsResponse = response.json().await?;
        if payload.status != TTS_STATUS_OK {
            return Err(RemoteError::UnexpectedPayload(format!(
                "TTS status {}: {}",
                payload.status,
                payload.info.unwrap_or_default()
            )));
        }

        payload
            .voice_url
            .filter(|u| !u.is_empty())
            .ok_or(RemoteError::MissingField("voiceUrl"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> TtsClient {
        TtsClient::new(TtsConfig {
            api_url: format!("{}/textToVoice", server.uri()),
            api_token: "tok".to_string(),
            voice: "2".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/textToVoice"))
            .and(query_param("text", "hello"))
            .and(query_param("sex", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 1001,
                "info": "success",
                "voiceUrl": "https://cdn.example.com/voice.mp3"
            })))
            .mount(&server)
            .await;

        let url = client_for(&server).await.synthesize("hello").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/voice.mp3");
    }

    #[tokio::test]
    async fn test_synthesize_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/textToVoice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 2002,
                "info": "quota exhausted"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.synthesize("hello").await.unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_synthesize_missing_voice_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/textToVoice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 1001
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.synthesize("hello").await.unwrap_err();
        assert!(matches!(err, RemoteError::MissingField("voiceUrl")));
    }
}
