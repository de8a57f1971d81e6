//! Streaming file fetch.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

/// Default timeout for bulk media transfers.
const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Stream a URL into `target_path`.
///
/// The file is flushed and synced before returning so a downstream message
/// never references a partially written artifact.
pub async fn fetch_to_file(url: &str, target_path: impl AsRef<Path>) -> RemoteResult<()> {
    let target_path = target_path.as_ref();

    if let Some(parent) = target_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteError::request_failed(status, body));
    }

    let mut file = tokio::fs::File::create(target_path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if chunk.is_empty() {
            continue;
        }
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    debug!(url, bytes = written, path = %target_path.display(), "Fetched file");
    Ok(())
}
