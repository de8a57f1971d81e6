//! Download stage: resolve the source page URL and fetch the video.

use tracing::info;

use vidmill_media::{ensure_dir, unique_artifact_path};
use vidmill_models::{DownloadJob, Stage, StageMessage, VoiceJob};
use vidmill_remote::fetch_to_file;

use crate::context::StageContext;
use crate::error::StageResult;

pub async fn handle(ctx: &StageContext, job: &DownloadJob) -> StageResult<()> {
    job.validate()?;

    let download_url = ctx.resolver.resolve(&job.url).await?;

    let stage_dir = ctx.config.stage_dir(Stage::Download);
    ensure_dir(&stage_dir).await?;
    let target = unique_artifact_path(&stage_dir, job.record_id, "", "mp4");

    fetch_to_file(&download_url, &target).await?;

    info!(
        record_id = job.record_id,
        table_id = %job.table_id,
        path = %target.display(),
        "Downloaded source video"
    );

    let downstream = StageMessage::Voice(VoiceJob {
        record_id: job.record_id,
        table_id: job.table_id.clone(),
        local_video_path: target.to_string_lossy().into_owned(),
        content: job.content.clone(),
    });
    ctx.transport.enqueue(&downstream).await?;

    Ok(())
}
