//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use vidmill_media::CompositionParams;
use vidmill_models::Stage;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Stages this worker consumes
    pub stages: Vec<Stage>,
    /// Maximum concurrent messages in flight
    pub max_concurrent_jobs: usize,
    /// XREADGROUP block time per stage poll
    pub consume_block_ms: u64,
    /// How often the worker scans for orphaned pending messages
    pub claim_interval: Duration,
    /// Minimum idle time before a pending message can be claimed
    pub claim_min_idle: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Root directory for stage artifacts
    pub work_dir: PathBuf,
    /// Base seed for animation rendering
    pub base_seed: u64,
    /// Compositor parameters
    pub composition: CompositionParams,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            stages: Stage::ALL.to_vec(),
            max_concurrent_jobs: 2,
            consume_block_ms: 1000,
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
            shutdown_timeout: Duration::from_secs(60),
            work_dir: PathBuf::from("/tmp/vidmill"),
            base_seed: 42,
            composition: CompositionParams::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            stages: parse_stages(std::env::var("WORKER_STAGES").ok().as_deref()),
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS", defaults.max_concurrent_jobs),
            consume_block_ms: env_parse("WORKER_CONSUME_BLOCK_MS", defaults.consume_block_ms),
            claim_interval: Duration::from_secs(env_parse("WORKER_CLAIM_INTERVAL_SECS", 30)),
            claim_min_idle: Duration::from_secs(env_parse("WORKER_CLAIM_MIN_IDLE_SECS", 300)),
            shutdown_timeout: Duration::from_secs(env_parse("WORKER_SHUTDOWN_TIMEOUT", 60)),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            base_seed: env_parse("WORKER_BASE_SEED", defaults.base_seed),
            composition: composition_from_env(),
        }
    }

    /// Artifact directory for one stage, under the work root.
    pub fn stage_dir(&self, stage: Stage) -> PathBuf {
        self.work_dir.join(stage.label())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Parse the worker's stage list; unknown names are skipped with the rest
/// of the list kept, an empty result falls back to all stages.
fn parse_stages(raw: Option<&str>) -> Vec<Stage> {
    let Some(raw) = raw else {
        return Stage::ALL.to_vec();
    };

    let stages: Vec<Stage> = raw
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    if stages.is_empty() {
        Stage::ALL.to_vec()
    } else {
        stages
    }
}

fn composition_from_env() -> CompositionParams {
    let defaults = CompositionParams::default();

    CompositionParams {
        overlay_scale_ratio: env_parse("COMPOSE_OVERLAY_SCALE_RATIO", defaults.overlay_scale_ratio),
        overlay_margin_x: env_parse("COMPOSE_OVERLAY_MARGIN_X", defaults.overlay_margin_x),
        overlay_margin_y: env_parse("COMPOSE_OVERLAY_MARGIN_Y", defaults.overlay_margin_y),
        x264_preset: std::env::var("COMPOSE_X264_PRESET").unwrap_or(defaults.x264_preset),
        x264_crf: env_parse("COMPOSE_X264_CRF", defaults.x264_crf),
        target_total_bitrate_mbps: env_parse(
            "COMPOSE_TARGET_BITRATE_MBPS",
            defaults.target_total_bitrate_mbps,
        ),
        min_total_bitrate_mbps: env_parse(
            "COMPOSE_MIN_BITRATE_MBPS",
            defaults.min_total_bitrate_mbps,
        ),
        bitrate_step_kbps: env_parse("COMPOSE_BITRATE_STEP_KBPS", defaults.bitrate_step_kbps),
        audio_bitrate_kbps: env_parse("COMPOSE_AUDIO_BITRATE_KBPS", defaults.audio_bitrate_kbps),
        max_output_size_mb: env_parse("COMPOSE_MAX_OUTPUT_MB", defaults.max_output_size_mb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_consumes_all_stages() {
        let config = WorkerConfig::default();
        assert_eq!(config.stages.len(), 8);
    }

    #[test]
    fn test_parse_stage_subset() {
        let stages = parse_stages(Some("download, composite"));
        assert_eq!(stages, vec![Stage::Download, Stage::Composite]);
    }

    #[test]
    fn test_parse_unknown_stages_fall_back() {
        assert_eq!(parse_stages(Some("nope,")), Stage::ALL.to_vec());
        assert_eq!(parse_stages(None), Stage::ALL.to_vec());
    }

    #[test]
    fn test_stage_dir_uses_label() {
        let config = WorkerConfig::default();
        assert_eq!(
            config.stage_dir(Stage::Composite),
            PathBuf::from("/tmp/vidmill/s6")
        );
    }
}
