//! Upload stage: push the composited video to object storage.

use std::path::Path;

use tracing::info;

use vidmill_models::{RecordUpdateJob, StageMessage, UploadJob};

use crate::context::StageContext;
use crate::error::{StageError, StageResult};

pub async fn handle(ctx: &StageContext, job: &UploadJob) -> StageResult<()> {
    job.validate()?;

    let local = Path::new(&job.composited_video_path);
    if !local.exists() {
        return Err(StageError::resource_missing(local));
    }

    let title = format!("record_{}", job.record_id);
    let uploaded = ctx.storage.upload_video(local, &title).await?;

    info!(
        record_id = job.record_id,
        table_id = %job.table_id,
        public_url = %uploaded.public_url,
        expiration = uploaded.expiration_date_gmt.as_deref().unwrap_or("none"),
        "Uploaded composited video"
    );

    let downstream = StageMessage::RecordUpdate(RecordUpdateJob {
        record_id: job.record_id,
        table_id: job.table_id.clone(),
        public_url: uploaded.public_url,
    });
    ctx.transport.enqueue(&downstream).await?;

    Ok(())
}
