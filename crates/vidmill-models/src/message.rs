//! Typed per-stage message contracts.
//!
//! Every message a stage consumes is a tagged struct validated at the
//! producer and again at the consumer, so a field mismatch between two
//! stages fails loudly at deserialization or validation instead of being
//! silently misread from a positional tuple.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ContractError;
use crate::stage::Stage;

/// Job identity: one content record's passage through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub record_id: i64,
    pub table_id: String,
}

impl JobKey {
    pub fn new(record_id: i64, table_id: impl Into<String>) -> Self {
        Self {
            record_id,
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table_id, self.record_id)
    }
}

fn check_record_id(record_id: i64) -> Result<(), ContractError> {
    if record_id <= 0 {
        return Err(ContractError::NonPositiveRecordId(record_id));
    }
    Ok(())
}

fn check_url(field: &'static str, value: &str) -> Result<(), ContractError> {
    url::Url::parse(value).map_err(|_| ContractError::InvalidUrl {
        field,
        value: value.to_string(),
    })?;
    Ok(())
}

macro_rules! require_non_empty {
    ($handler:expr, $($field:ident = $value:expr),+ $(,)?) => {{
        let mut missing: Vec<&'static str> = Vec::new();
        $(
            if $value.trim().is_empty() {
                missing.push(stringify!($field));
            }
        )+
        if !missing.is_empty() {
            return Err(ContractError::missing_fields($handler, missing));
        }
    }};
}

/// Validated webhook row accepted into the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestJob {
    pub record_id: i64,
    pub table_id: String,
    pub source_url: String,
    pub content: String,
}

impl IngestJob {
    pub fn validate(&self) -> Result<(), ContractError> {
        check_record_id(self.record_id)?;
        require_non_empty!(
            "ingest.process",
            table_id = self.table_id,
            source_url = self.source_url,
            content = self.content,
        );
        check_url("source_url", &self.source_url)
    }
}

/// Resolve and download the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadJob {
    pub record_id: i64,
    pub table_id: String,
    pub url: String,
    pub content: String,
}

impl DownloadJob {
    pub fn validate(&self) -> Result<(), ContractError> {
        check_record_id(self.record_id)?;
        require_non_empty!(
            "download.process",
            table_id = self.table_id,
            url = self.url,
            content = self.content,
        );
        check_url("url", &self.url)
    }
}

/// Synthesize speech from the record's text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceJob {
    pub record_id: i64,
    pub table_id: String,
    pub local_video_path: String,
    pub content: String,
}

impl VoiceJob {
    pub fn validate(&self) -> Result<(), ContractError> {
        check_record_id(self.record_id)?;
        require_non_empty!(
            "voice.process",
            table_id = self.table_id,
            local_video_path = self.local_video_path,
            content = self.content,
        );
        Ok(())
    }
}

/// Render the AI-animated foreground clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceJob {
    pub record_id: i64,
    pub table_id: String,
    pub local_video_path: String,
    pub audio_path: String,
}

impl InferenceJob {
    pub fn validate(&self) -> Result<(), ContractError> {
        check_record_id(self.record_id)?;
        require_non_empty!(
            "inference.process",
            table_id = self.table_id,
            local_video_path = self.local_video_path,
            audio_path = self.audio_path,
        );
        Ok(())
    }
}

/// B-roll selection input; currently passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrollJob {
    pub record_id: i64,
    pub table_id: String,
    pub local_video_path: String,
    pub audio_path: String,
    pub inference_video_path: String,
}

impl BrollJob {
    pub fn validate(&self) -> Result<(), ContractError> {
        check_record_id(self.record_id)?;
        require_non_empty!(
            "broll.process",
            table_id = self.table_id,
            local_video_path = self.local_video_path,
            audio_path = self.audio_path,
            inference_video_path = self.inference_video_path,
        );
        Ok(())
    }
}

/// Composite background, foreground and audio into one bounded-size file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeJob {
    pub record_id: i64,
    pub table_id: String,
    pub local_video_path: String,
    pub audio_path: String,
    pub inference_video_path: String,
}

impl CompositeJob {
    pub fn validate(&self) -> Result<(), ContractError> {
        check_record_id(self.record_id)?;
        require_non_empty!(
            "composite.process",
            table_id = self.table_id,
            local_video_path = self.local_video_path,
            audio_path = self.audio_path,
            inference_video_path = self.inference_video_path,
        );
        Ok(())
    }
}

/// Upload the composited video to object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadJob {
    pub record_id: i64,
    pub table_id: String,
    pub composited_video_path: String,
}

impl UploadJob {
    pub fn validate(&self) -> Result<(), ContractError> {
        check_record_id(self.record_id)?;
        require_non_empty!(
            "upload.process",
            table_id = self.table_id,
            composited_video_path = self.composited_video_path,
        );
        Ok(())
    }
}

/// Write the public URL back to the originating table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdateJob {
    pub record_id: i64,
    pub table_id: String,
    pub public_url: String,
}

impl RecordUpdateJob {
    pub fn validate(&self) -> Result<(), ContractError> {
        check_record_id(self.record_id)?;
        require_non_empty!(
            "record_update.process",
            table_id = self.table_id,
            public_url = self.public_url,
        );
        check_url("public_url", &self.public_url)
    }
}

/// A message on a stage queue.
///
/// The tag doubles as the destination handler name; `Ping` is a
/// no-argument liveness probe accepted on every queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "handler", content = "args")]
pub enum StageMessage {
    #[serde(rename = "ingest.process")]
    Ingest(IngestJob),
    #[serde(rename = "download.process")]
    Download(DownloadJob),
    #[serde(rename = "voice.process")]
    Voice(VoiceJob),
    #[serde(rename = "inference.process")]
    Inference(InferenceJob),
    #[serde(rename = "broll.process")]
    Broll(BrollJob),
    #[serde(rename = "composite.process")]
    Composite(CompositeJob),
    #[serde(rename = "upload.process")]
    Upload(UploadJob),
    #[serde(rename = "record_update.process")]
    RecordUpdate(RecordUpdateJob),
    #[serde(rename = "ping")]
    Ping,
}

impl StageMessage {
    /// Handler name carried on the wire.
    pub fn handler_name(&self) -> &'static str {
        match self {
            StageMessage::Ingest(_) => "ingest.process",
            StageMessage::Download(_) => "download.process",
            StageMessage::Voice(_) => "voice.process",
            StageMessage::Inference(_) => "inference.process",
            StageMessage::Broll(_) => "broll.process",
            StageMessage::Composite(_) => "composite.process",
            StageMessage::Upload(_) => "upload.process",
            StageMessage::RecordUpdate(_) => "record_update.process",
            StageMessage::Ping => "ping",
        }
    }

    /// The stage whose queue this message belongs on. `None` for `Ping`,
    /// which is valid on every queue.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            StageMessage::Ingest(_) => Some(Stage::Ingest),
            StageMessage::Download(_) => Some(Stage::Download),
            StageMessage::Voice(_) => Some(Stage::VoiceSynthesis),
            StageMessage::Inference(_) => Some(Stage::Inference),
            StageMessage::Broll(_) => Some(Stage::Broll),
            StageMessage::Composite(_) => Some(Stage::Composite),
            StageMessage::Upload(_) => Some(Stage::Upload),
            StageMessage::RecordUpdate(_) => Some(Stage::RecordUpdate),
            StageMessage::Ping => None,
        }
    }

    /// Job identity, if the message carries one.
    pub fn job_key(&self) -> Option<JobKey> {
        let (record_id, table_id) = match self {
            StageMessage::Ingest(j) => (j.record_id, &j.table_id),
            StageMessage::Download(j) => (j.record_id, &j.table_id),
            StageMessage::Voice(j) => (j.record_id, &j.table_id),
            StageMessage::Inference(j) => (j.record_id, &j.table_id),
            StageMessage::Broll(j) => (j.record_id, &j.table_id),
            StageMessage::Composite(j) => (j.record_id, &j.table_id),
            StageMessage::Upload(j) => (j.record_id, &j.table_id),
            StageMessage::RecordUpdate(j) => (j.record_id, &j.table_id),
            StageMessage::Ping => return None,
        };
        Some(JobKey::new(record_id, table_id.clone()))
    }

    /// Validate required fields. Run by the producer before enqueue and by
    /// the consumer before any external call.
    pub fn validate(&self) -> Result<(), ContractError> {
        match self {
            StageMessage::Ingest(j) => j.validate(),
            StageMessage::Download(j) => j.validate(),
            StageMessage::Voice(j) => j.validate(),
            StageMessage::Inference(j) => j.validate(),
            StageMessage::Broll(j) => j.validate(),
            StageMessage::Composite(j) => j.validate(),
            StageMessage::Upload(j) => j.validate(),
            StageMessage::RecordUpdate(j) => j.validate(),
            StageMessage::Ping => Ok(()),
        }
    }

    /// Check that this message is deliverable on `stage`'s queue.
    pub fn check_queue(&self, stage: Stage) -> Result<(), ContractError> {
        match self.stage() {
            None => Ok(()),
            Some(s) if s == stage => Ok(()),
            Some(_) => Err(ContractError::WrongQueue {
                handler: self.handler_name(),
                queue: stage.queue_name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download_job() -> DownloadJob {
        DownloadJob {
            record_id: 7,
            table_id: "T1".to_string(),
            url: "https://example.com/v/abc".to_string(),
            content: "caption text".to_string(),
        }
    }

    #[test]
    fn test_valid_download_job_passes() {
        assert!(download_job().validate().is_ok());
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut job = download_job();
        job.url = "".to_string();
        let err = job.validate().unwrap_err();
        assert!(matches!(err, ContractError::MissingFields { .. }));
    }

    #[test]
    fn test_missing_content_rejected() {
        let mut job = download_job();
        job.content = "   ".to_string();
        let err = job.validate().unwrap_err();
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn test_malformed_url_rejected() {
        let mut job = download_job();
        job.url = "not a url".to_string();
        assert!(matches!(
            job.validate().unwrap_err(),
            ContractError::InvalidUrl { field: "url", .. }
        ));
    }

    #[test]
    fn test_non_positive_record_id_rejected() {
        let mut job = download_job();
        job.record_id = 0;
        assert!(matches!(
            job.validate().unwrap_err(),
            ContractError::NonPositiveRecordId(0)
        ));
    }

    #[test]
    fn test_message_tagged_by_handler_name() {
        let msg = StageMessage::Download(download_job());
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"handler\":\"download.process\""));
        let back: StageMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_ping_valid_on_any_queue() {
        for stage in Stage::ALL {
            assert!(StageMessage::Ping.check_queue(stage).is_ok());
        }
    }

    #[test]
    fn test_wrong_queue_detected() {
        let msg = StageMessage::Download(download_job());
        assert!(msg.check_queue(Stage::Download).is_ok());
        assert!(matches!(
            msg.check_queue(Stage::Composite).unwrap_err(),
            ContractError::WrongQueue { .. }
        ));
    }

    #[test]
    fn test_job_key_display() {
        let key = JobKey::new(7, "T1");
        assert_eq!(key.to_string(), "T1/7");
    }
}
