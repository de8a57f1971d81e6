//! FFmpeg CLI wrapper and the adaptive compositor.
//!
//! This crate provides:
//! - Media probing (duration, frame rate, bitrate) via ffprobe
//! - An FFmpeg command builder and subprocess runner
//! - Composite filter-graph construction and time remapping
//! - A bounded bitrate search that holds output under a size budget

pub mod bitrate;
pub mod command;
pub mod compose;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;

pub use bitrate::{Attempt, BitrateSearch, SearchParams, Verdict};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compose::{compose, plan_composition, ComposePlan, CompositionParams};
pub use error::{MediaError, MediaResult};
pub use filters::{build_composite_filter, remap_factor, OverlayLayout};
pub use fs_utils::{ensure_dir, file_size_mb, unique_artifact_path};
pub use probe::{get_duration, probe_media, MediaInfo};
