//! The fixed eight-stage pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// One queue-bound processing step in the pipeline.
///
/// Transitions are one-way: each stage enqueues only to `next()`, and no
/// stage revisits an earlier one. The absorbing failure state is the DLQ,
/// owned by the transport rather than modeled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    Download,
    VoiceSynthesis,
    Inference,
    Broll,
    Composite,
    Upload,
    RecordUpdate,
}

impl Stage {
    /// All stages, in pipeline order.
    pub const ALL: [Stage; 8] = [
        Stage::Ingest,
        Stage::Download,
        Stage::VoiceSynthesis,
        Stage::Inference,
        Stage::Broll,
        Stage::Composite,
        Stage::Upload,
        Stage::RecordUpdate,
    ];

    /// Redis Stream name consumed by this stage.
    pub fn queue_name(&self) -> &'static str {
        match self {
            Stage::Ingest => "vidmill:s1:ingest",
            Stage::Download => "vidmill:s2:download",
            Stage::VoiceSynthesis => "vidmill:s3:voice",
            Stage::Inference => "vidmill:s4:inference",
            Stage::Broll => "vidmill:s5:broll",
            Stage::Composite => "vidmill:s6:composite",
            Stage::Upload => "vidmill:s7:upload",
            Stage::RecordUpdate => "vidmill:s8:record-update",
        }
    }

    /// Short stage label used in logs (`s1`..`s8`).
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Ingest => "s1",
            Stage::Download => "s2",
            Stage::VoiceSynthesis => "s3",
            Stage::Inference => "s4",
            Stage::Broll => "s5",
            Stage::Composite => "s6",
            Stage::Upload => "s7",
            Stage::RecordUpdate => "s8",
        }
    }

    /// The downstream stage, or `None` for the terminal stage.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Ingest => Some(Stage::Download),
            Stage::Download => Some(Stage::VoiceSynthesis),
            Stage::VoiceSynthesis => Some(Stage::Inference),
            Stage::Inference => Some(Stage::Broll),
            Stage::Broll => Some(Stage::Composite),
            Stage::Composite => Some(Stage::Upload),
            Stage::Upload => Some(Stage::RecordUpdate),
            Stage::RecordUpdate => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Download => "download",
            Stage::VoiceSynthesis => "voice_synthesis",
            Stage::Inference => "inference",
            Stage::Broll => "broll",
            Stage::Composite => "composite",
            Stage::Upload => "upload",
            Stage::RecordUpdate => "record_update",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingest" | "s1" => Ok(Stage::Ingest),
            "download" | "s2" => Ok(Stage::Download),
            "voice_synthesis" | "voice" | "s3" => Ok(Stage::VoiceSynthesis),
            "inference" | "s4" => Ok(Stage::Inference),
            "broll" | "s5" => Ok(Stage::Broll),
            "composite" | "s6" => Ok(Stage::Composite),
            "upload" | "s7" => Ok(Stage::Upload),
            "record_update" | "s8" => Ok(Stage::RecordUpdate),
            other => Err(ContractError::UnknownStage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order_is_linear() {
        let mut stage = Stage::Ingest;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(visited, Stage::ALL);
        assert_eq!(stage, Stage::RecordUpdate);
    }

    #[test]
    fn test_queue_names_are_unique() {
        let mut names: Vec<_> = Stage::ALL.iter().map(|s| s.queue_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Stage::ALL.len());
    }

    #[test]
    fn test_from_str_accepts_labels() {
        assert_eq!("s6".parse::<Stage>().unwrap(), Stage::Composite);
        assert_eq!("download".parse::<Stage>().unwrap(), Stage::Download);
        assert!("s9".parse::<Stage>().is_err());
    }
}
