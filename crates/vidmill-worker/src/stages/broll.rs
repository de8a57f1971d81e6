//! B-roll selection stage.
//!
//! Selection is not implemented yet; the stage forwards its inputs
//! unchanged so the queue topology already has the slot.

use tracing::info;

use vidmill_models::{BrollJob, CompositeJob, StageMessage};

use crate::context::StageContext;
use crate::error::StageResult;

pub async fn handle(ctx: &StageContext, job: &BrollJob) -> StageResult<()> {
    job.validate()?;

    info!(
        record_id = job.record_id,
        table_id = %job.table_id,
        "B-roll pass-through"
    );

    let downstream = StageMessage::Composite(CompositeJob {
        record_id: job.record_id,
        table_id: job.table_id.clone(),
        local_video_path: job.local_video_path.clone(),
        audio_path: job.audio_path.clone(),
        inference_video_path: job.inference_video_path.clone(),
    });
    ctx.transport.enqueue(&downstream).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use vidmill_models::{BrollJob, CompositeJob};

    #[test]
    fn test_pass_through_field_mapping() {
        let job = BrollJob {
            record_id: 7,
            table_id: "T1".to_string(),
            local_video_path: "/data/s2/bg.mp4".to_string(),
            audio_path: "/data/s3/voice.mp3".to_string(),
            inference_video_path: "/data/s4/fg.mp4".to_string(),
        };

        let downstream = CompositeJob {
            record_id: job.record_id,
            table_id: job.table_id.clone(),
            local_video_path: job.local_video_path.clone(),
            audio_path: job.audio_path.clone(),
            inference_video_path: job.inference_video_path.clone(),
        };

        assert_eq!(downstream.local_video_path, job.local_video_path);
        assert_eq!(downstream.audio_path, job.audio_path);
        assert_eq!(downstream.inference_video_path, job.inference_video_path);
        assert!(downstream.validate().is_ok());
    }
}
