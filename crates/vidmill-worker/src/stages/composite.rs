//! Composite stage: reconcile and encode the final video.

use std::path::Path;

use tracing::info;

use vidmill_media::{compose, ensure_dir, unique_artifact_path};
use vidmill_models::{CompositeJob, Stage, StageMessage, UploadJob};

use crate::context::StageContext;
use crate::error::{StageError, StageResult};

pub async fn handle(ctx: &StageContext, job: &CompositeJob) -> StageResult<()> {
    job.validate()?;

    let bg = Path::new(&job.local_video_path);
    let fg = Path::new(&job.inference_video_path);
    let audio = Path::new(&job.audio_path);
    for input in [bg, fg, audio] {
        if !input.exists() {
            return Err(StageError::resource_missing(input));
        }
    }

    let stage_dir = ctx.config.stage_dir(Stage::Composite);
    ensure_dir(&stage_dir).await?;
    let output = unique_artifact_path(&stage_dir, job.record_id, "composited", "mp4");

    let output = compose(bg, fg, audio, &output, &ctx.config.composition).await?;

    info!(
        record_id = job.record_id,
        table_id = %job.table_id,
        path = %output.display(),
        "Composited final video"
    );

    let downstream = StageMessage::Upload(UploadJob {
        record_id: job.record_id,
        table_id: job.table_id.clone(),
        composited_video_path: output.to_string_lossy().into_owned(),
    });
    ctx.transport.enqueue(&downstream).await?;

    Ok(())
}
