//! AI-animation capability.
//!
//! The animation model is an opaque collaborator: given a condition video,
//! an audio clip and a seed, produce a rendered video. The trait is the
//! seam where a real model client plugs in; the shipped engine is a
//! pass-through that uses the condition video as the rendered result.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use vidmill_media::{ensure_dir, unique_artifact_path};

use crate::error::{RemoteError, RemoteResult};

/// Renders an animated foreground clip.
#[async_trait]
pub trait AnimationEngine: Send + Sync {
    /// Produce a rendered video driven by `audio_path`, conditioned on
    /// `condition_video_path`. Output lands in `output_dir` under a fresh
    /// name for `record_id`.
    async fn render(
        &self,
        record_id: i64,
        condition_video_path: &Path,
        audio_path: &Path,
        seed: u64,
        output_dir: &Path,
    ) -> RemoteResult<PathBuf>;
}

/// Pass-through engine: copies the condition video as the rendered result.
#[derive(Debug, Default)]
pub struct PassthroughEngine;

#[async_trait]
impl AnimationEngine for PassthroughEngine {
    async fn render(
        &self,
        record_id: i64,
        condition_video_path: &Path,
        audio_path: &Path,
        seed: u64,
        output_dir: &Path,
    ) -> RemoteResult<PathBuf> {
        if !condition_video_path.exists() {
            return Err(RemoteError::Media(vidmill_media::MediaError::FileNotFound(
                condition_video_path.to_path_buf(),
            )));
        }
        if !audio_path.exists() {
            return Err(RemoteError::Media(vidmill_media::MediaError::FileNotFound(
                audio_path.to_path_buf(),
            )));
        }

        ensure_dir(output_dir).await?;
        let output_path = unique_artifact_path(output_dir, record_id, "inference", "mp4");
        tokio::fs::copy(condition_video_path, &output_path).await?;

        info!(
            record_id,
            seed,
            output = %output_path.display(),
            "Pass-through animation render"
        );
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_copies_condition_video() {
        let dir = tempfile::TempDir::new().unwrap();
        let condition = dir.path().join("condition.mp4");
        let audio = dir.path().join("voice.mp3");
        std::fs::write(&condition, b"video bytes").unwrap();
        std::fs::write(&audio, b"audio bytes").unwrap();

        let engine = PassthroughEngine;
        let out = engine
            .render(7, &condition, &audio, 42, dir.path())
            .await
            .unwrap();

        assert_ne!(out, condition);
        assert_eq!(std::fs::read(&out).unwrap(), b"video bytes");
    }

    #[tokio::test]
    async fn test_passthrough_rejects_missing_inputs() {
        let dir = tempfile::TempDir::new().unwrap();
        let audio = dir.path().join("voice.mp3");
        std::fs::write(&audio, b"audio bytes").unwrap();

        let engine = PassthroughEngine;
        let err = engine
            .render(7, &dir.path().join("missing.mp4"), &audio, 42, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Media(_)));
    }
}
