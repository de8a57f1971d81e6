//! Record-update stage: write the public URL back to the source table.
//!
//! Terminal stage; nothing is enqueued downstream.

use tracing::info;

use vidmill_models::RecordUpdateJob;

use crate::context::StageContext;
use crate::error::StageResult;

pub async fn handle(ctx: &StageContext, job: &RecordUpdateJob) -> StageResult<()> {
    job.validate()?;

    ctx.records
        .update_public_url(&job.table_id, job.record_id, &job.public_url)
        .await?;

    metrics::counter!("vidmill_pipeline_completed_total").increment(1);
    info!(
        record_id = job.record_id,
        table_id = %job.table_id,
        public_url = %job.public_url,
        "Pipeline complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use vidmill_models::RecordUpdateJob;

    #[test]
    fn test_non_url_rejected() {
        let job = RecordUpdateJob {
            record_id: 7,
            table_id: "T1".to_string(),
            public_url: "not a url".to_string(),
        };
        assert!(job.validate().is_err());
    }
}
