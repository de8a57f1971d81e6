//! Remote collaborator error types.

use thiserror::Error;

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Response missing expected field: {0}")]
    MissingField(&'static str),

    #[error("Unexpected response payload: {0}")]
    UnexpectedPayload(String),

    #[error("Uploaded object URL is not an mp4 URL: {0}")]
    NotAnMp4Url(String),

    #[error("Media error: {0}")]
    Media(#[from] vidmill_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    pub fn request_failed(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        // Collaborator error bodies can be arbitrarily large.
        body.truncate(1000);
        Self::RequestFailed { status, body }
    }

    /// Transient failures the transport may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::RequestFailed { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            _ => false,
        }
    }
}
