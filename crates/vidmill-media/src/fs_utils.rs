//! Filesystem helpers for pipeline artifacts.
//!
//! Every stage writes its output under a fresh randomized name, so a
//! redelivered message produces a new file instead of clobbering a
//! half-written one. Retries are idempotent in effect, not in identity.

use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};

/// Create `dir` (and parents) if missing.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    tokio::fs::create_dir_all(dir.as_ref()).await?;
    Ok(())
}

/// Generate a fresh artifact path: `record_{id}_{uuid}[_{suffix}].{ext}`.
pub fn unique_artifact_path(dir: impl AsRef<Path>, record_id: i64, suffix: &str, ext: &str) -> PathBuf {
    let token = uuid::Uuid::new_v4().simple();
    let filename = if suffix.is_empty() {
        format!("record_{}_{}.{}", record_id, token, ext)
    } else {
        format!("record_{}_{}_{}.{}", record_id, token, suffix, ext)
    };
    dir.as_ref().join(filename)
}

/// File size in MB (binary, 1 MB = 1024*1024 bytes).
pub fn file_size_mb(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .map_err(|_| MediaError::FileNotFound(path.to_path_buf()))?;
    Ok(metadata.len() as f64 / (1024.0 * 1024.0))
}
