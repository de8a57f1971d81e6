//! Shared data models for the vidmill pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - The fixed eight-stage pipeline and its queue names
//! - Typed per-stage message contracts with field validation
//! - Job identity (`record_id`, `table_id`) used in logs

pub mod error;
pub mod message;
pub mod stage;

pub use error::ContractError;
pub use message::{
    BrollJob, CompositeJob, DownloadJob, IngestJob, InferenceJob, JobKey, RecordUpdateJob,
    StageMessage, UploadJob, VoiceJob,
};
pub use stage::Stage;
