//! Ingest stage: re-validate the accepted row and hand it to download.

use tracing::info;

use vidmill_models::{DownloadJob, IngestJob, StageMessage};

use crate::context::StageContext;
use crate::error::StageResult;

pub async fn handle(ctx: &StageContext, job: &IngestJob) -> StageResult<()> {
    job.validate()?;

    info!(
        record_id = job.record_id,
        table_id = %job.table_id,
        "Ingesting record"
    );

    let downstream = StageMessage::Download(DownloadJob {
        record_id: job.record_id,
        table_id: job.table_id.clone(),
        url: job.source_url.clone(),
        content: job.content.clone(),
    });
    ctx.transport.enqueue(&downstream).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use vidmill_models::IngestJob;

    #[test]
    fn test_invalid_job_fails_validation_before_side_effects() {
        let job = IngestJob {
            record_id: 7,
            table_id: "T1".to_string(),
            source_url: "".to_string(),
            content: "text".to_string(),
        };
        assert!(job.validate().is_err());
    }
}
