//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Media duration probed to zero: {0}")]
    DurationZero(PathBuf),

    #[error("Invalid media file: {0}")]
    InvalidMedia(String),

    #[error(
        "Output exceeds size budget even at minimum bitrate: {size_mb:.2} MB > {limit_mb} MB (min_total={min_total_kbps} kbps)"
    )]
    MinBitrateExceeded {
        size_mb: f64,
        limit_mb: u64,
        min_total_kbps: u32,
    },

    #[error(
        "Unable to reduce bitrate further while output remains oversized: {size_mb:.2} MB > {limit_mb} MB"
    )]
    BudgetExceeded { size_mb: f64, limit_mb: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Terminal failures where retrying the same inputs cannot succeed.
    pub fn is_budget_failure(&self) -> bool {
        matches!(
            self,
            MediaError::MinBitrateExceeded { .. } | MediaError::BudgetExceeded { .. }
        )
    }
}
