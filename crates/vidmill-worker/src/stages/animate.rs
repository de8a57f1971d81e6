//! AI-inference stage: render the animated foreground clip.

use std::path::Path;

use tracing::info;

use vidmill_media::ensure_dir;
use vidmill_models::{BrollJob, InferenceJob, Stage, StageMessage};

use crate::context::StageContext;
use crate::error::{StageError, StageResult};

pub async fn handle(ctx: &StageContext, job: &InferenceJob) -> StageResult<()> {
    job.validate()?;

    let condition_video = Path::new(&job.local_video_path);
    let audio = Path::new(&job.audio_path);
    if !condition_video.exists() {
        return Err(StageError::resource_missing(condition_video));
    }
    if !audio.exists() {
        return Err(StageError::resource_missing(audio));
    }

    let stage_dir = ctx.config.stage_dir(Stage::Inference);
    ensure_dir(&stage_dir).await?;

    // Seed derived from the record so re-renders of the same record are
    // reproducible while distinct records diverge.
    let seed = ctx.config.base_seed.wrapping_add(job.record_id as u64);

    let rendered = ctx
        .animation
        .render(job.record_id, condition_video, audio, seed, &stage_dir)
        .await?;

    info!(
        record_id = job.record_id,
        table_id = %job.table_id,
        path = %rendered.display(),
        "Rendered foreground clip"
    );

    let downstream = StageMessage::Broll(BrollJob {
        record_id: job.record_id,
        table_id: job.table_id.clone(),
        local_video_path: job.local_video_path.clone(),
        audio_path: job.audio_path.clone(),
        inference_video_path: rendered.to_string_lossy().into_owned(),
    });
    ctx.transport.enqueue(&downstream).await?;

    Ok(())
}
