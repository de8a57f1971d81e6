//! Stage error types.

use std::path::PathBuf;

use thiserror::Error;

pub type StageResult<T> = Result<T, StageError>;

#[derive(Debug, Error)]
pub enum StageError {
    #[error("Contract error: {0}")]
    Contract(#[from] vidmill_models::ContractError),

    #[error("Resource missing: {0}")]
    ResourceMissing(PathBuf),

    #[error("Media error: {0}")]
    Media(#[from] vidmill_media::MediaError),

    #[error("Remote error: {0}")]
    Remote(#[from] vidmill_remote::RemoteError),

    #[error("Transport error: {0}")]
    Transport(#[from] vidmill_queue::TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError {
    pub fn resource_missing(path: impl Into<PathBuf>) -> Self {
        Self::ResourceMissing(path.into())
    }

    /// Whether redelivering the message could succeed.
    ///
    /// Contract violations, missing artifacts and budget exhaustion are
    /// deterministic; they dead-letter on the first failure. Remote and
    /// transport failures are assumed transient unless the remote error
    /// classifies itself otherwise.
    pub fn is_retryable(&self) -> bool {
        match self {
            StageError::Contract(_) => false,
            StageError::ResourceMissing(_) => false,
            StageError::Media(e) => !e.is_budget_failure() && is_retryable_media(e),
            StageError::Remote(e) => e.is_retryable(),
            StageError::Transport(_) => true,
            StageError::Io(_) => true,
        }
    }
}

fn is_retryable_media(e: &vidmill_media::MediaError) -> bool {
    // Encoding and probing are deterministic for a given input; only
    // filesystem-level trouble is worth a redelivery.
    matches!(e, vidmill_media::MediaError::Io(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidmill_media::MediaError;
    use vidmill_models::ContractError;

    #[test]
    fn test_contract_errors_not_retryable() {
        let err = StageError::Contract(ContractError::NonPositiveRecordId(0));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_budget_failure_not_retryable() {
        let err = StageError::Media(MediaError::BudgetExceeded {
            size_mb: 31.2,
            limit_mb: 30,
        });
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_missing_artifact_not_retryable() {
        let err = StageError::resource_missing("/data/s2/record_7.mp4");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_io_retryable() {
        let err = StageError::Io(std::io::Error::other("disk hiccup"));
        assert!(err.is_retryable());
    }
}
