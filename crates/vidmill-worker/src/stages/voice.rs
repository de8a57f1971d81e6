//! Voice synthesis stage: turn the record's text into an audio artifact.

use std::path::Path;

use tracing::info;

use vidmill_media::{ensure_dir, unique_artifact_path};
use vidmill_models::{InferenceJob, Stage, StageMessage, VoiceJob};
use vidmill_remote::fetch_to_file;

use crate::context::StageContext;
use crate::error::{StageError, StageResult};

pub async fn handle(ctx: &StageContext, job: &VoiceJob) -> StageResult<()> {
    job.validate()?;

    if !Path::new(&job.local_video_path).exists() {
        return Err(StageError::resource_missing(&job.local_video_path));
    }

    let audio_url = ctx.tts.synthesize(&job.content).await?;

    let stage_dir = ctx.config.stage_dir(Stage::VoiceSynthesis);
    ensure_dir(&stage_dir).await?;
    let target = unique_artifact_path(&stage_dir, job.record_id, "voice", "mp3");

    fetch_to_file(&audio_url, &target).await?;

    info!(
        record_id = job.record_id,
        table_id = %job.table_id,
        path = %target.display(),
        "Synthesized voice track"
    );

    let downstream = StageMessage::Inference(InferenceJob {
        record_id: job.record_id,
        table_id: job.table_id.clone(),
        local_video_path: job.local_video_path.clone(),
        audio_path: target.to_string_lossy().into_owned(),
    });
    ctx.transport.enqueue(&downstream).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use vidmill_models::VoiceJob;

    #[test]
    fn test_empty_content_rejected() {
        let job = VoiceJob {
            record_id: 7,
            table_id: "T1".to_string(),
            local_video_path: "/data/s2/record_7.mp4".to_string(),
            content: "  ".to_string(),
        };
        assert!(job.validate().is_err());
    }
}
