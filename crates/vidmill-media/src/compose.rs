//! Adaptive video compositor.
//!
//! Reconciles a background video, a synthesized foreground video and a
//! synthesized audio track of mismatched durations into a single mp4 at or
//! under a size budget. The foreground is authoritative for duration; the
//! background is time-remapped to match. Encoding runs through the bounded
//! bitrate search in [`crate::bitrate`].

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::bitrate::{BitrateSearch, SearchParams, Verdict};
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{build_composite_filter, remap_factor, OverlayLayout};
use crate::fs_utils::file_size_mb;
use crate::probe::{probe_media, MediaInfo};

/// Per-deployment composition parameters, read once per job.
#[derive(Debug, Clone)]
pub struct CompositionParams {
    /// Foreground scale ratio relative to its original size
    pub overlay_scale_ratio: f64,
    /// Foreground left margin in pixels
    pub overlay_margin_x: u32,
    /// Foreground bottom margin in pixels
    pub overlay_margin_y: u32,
    /// x264 preset
    pub x264_preset: String,
    /// x264 CRF
    pub x264_crf: u8,
    /// Fallback total bitrate target in mbps
    pub target_total_bitrate_mbps: f64,
    /// Minimum total bitrate in mbps
    pub min_total_bitrate_mbps: f64,
    /// Step applied when decrementing below the fallback, in kbps
    pub bitrate_step_kbps: u32,
    /// Configured audio bitrate in kbps
    pub audio_bitrate_kbps: u32,
    /// Output size budget in MB
    pub max_output_size_mb: u64,
}

impl Default for CompositionParams {
    fn default() -> Self {
        Self {
            overlay_scale_ratio: 0.18,
            overlay_margin_x: 18,
            overlay_margin_y: 18,
            x264_preset: "veryfast".to_string(),
            x264_crf: 20,
            target_total_bitrate_mbps: 0.6,
            min_total_bitrate_mbps: 0.35,
            bitrate_step_kbps: 50,
            audio_bitrate_kbps: 64,
            max_output_size_mb: 30,
        }
    }
}

impl CompositionParams {
    pub fn search_params(&self) -> SearchParams {
        SearchParams::from_config(
            self.target_total_bitrate_mbps,
            self.min_total_bitrate_mbps,
            self.bitrate_step_kbps,
            self.audio_bitrate_kbps,
            self.max_output_size_mb,
        )
    }

    pub fn overlay_layout(&self) -> OverlayLayout {
        OverlayLayout {
            scale_ratio: self.overlay_scale_ratio,
            margin_x: self.overlay_margin_x,
            margin_y: self.overlay_margin_y,
        }
    }
}

/// The time/scale reconciliation computed before any encoding.
#[derive(Debug, Clone)]
pub struct ComposePlan {
    /// Output duration; always the foreground's duration
    pub target_duration: f64,
    /// Background frame rate, preserved through the remap
    pub bg_fps: f64,
    /// PTS scale factor applied to the background
    pub bg_remap_factor: f64,
    /// Probed background total bitrate in kbps
    pub bg_bitrate_kbps: u32,
    /// Complete filter graph
    pub filter_graph: String,
}

/// Compute the reconciliation plan from probed inputs.
///
/// Fails with [`MediaError::DurationZero`] if either duration probes to
/// zero or less.
pub fn plan_composition(
    bg: &MediaInfo,
    bg_path: &Path,
    fg_duration: f64,
    fg_path: &Path,
    params: &CompositionParams,
) -> MediaResult<ComposePlan> {
    if bg.duration <= 0.0 {
        return Err(MediaError::DurationZero(bg_path.to_path_buf()));
    }
    if fg_duration <= 0.0 {
        return Err(MediaError::DurationZero(fg_path.to_path_buf()));
    }

    let factor = remap_factor(bg.duration, fg_duration);
    let filter_graph = build_composite_filter(factor, bg.fps, params.overlay_layout());

    Ok(ComposePlan {
        target_duration: fg_duration,
        bg_fps: bg.fps,
        bg_remap_factor: factor,
        bg_bitrate_kbps: bg.bitrate_kbps,
        filter_graph,
    })
}

/// Composite background, foreground and audio into `output_path`.
///
/// Both inputs' native audio is discarded; the synthesized track is the
/// sole audio, padded with silence to the target duration. Returns the
/// output path once an attempt fits the budget.
pub async fn compose(
    bg_path: impl AsRef<Path>,
    fg_path: impl AsRef<Path>,
    audio_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    params: &CompositionParams,
) -> MediaResult<PathBuf> {
    let bg_path = bg_path.as_ref();
    let fg_path = fg_path.as_ref();
    let audio_path = audio_path.as_ref();
    let output_path = output_path.as_ref();

    if !audio_path.exists() {
        return Err(MediaError::FileNotFound(audio_path.to_path_buf()));
    }

    let bg = probe_media(bg_path).await?;
    let fg = probe_media(fg_path).await?;
    let plan = plan_composition(&bg, bg_path, fg.duration, fg_path, params)?;

    info!(
        bg_duration = format!("{:.3}", bg.duration),
        fg_duration = format!("{:.3}", plan.target_duration),
        bg_remap_factor = format!("{:.6}", plan.bg_remap_factor),
        mode = if plan.bg_remap_factor > 1.0001 { "slow_down_bg" } else { "speed_up_bg" },
        "Duration reconcile"
    );

    let search_params = params.search_params();
    let mut search = BitrateSearch::new(plan.bg_bitrate_kbps, search_params);

    info!(
        bg_total_kbps = plan.bg_bitrate_kbps,
        initial_total_kbps = search.attempt().total_kbps,
        fallback_total_kbps = search_params.fallback_total_kbps,
        min_total_kbps = search_params.min_total_kbps,
        step_kbps = search_params.step_kbps,
        max_output_mb = search_params.max_output_size_mb,
        "Bitrate strategy"
    );

    let runner = FfmpegRunner::new();

    loop {
        let attempt = search.attempt();

        info!(
            attempt = attempt.index,
            total_kbps = attempt.total_kbps,
            video_kbps = attempt.video_kbps,
            audio_kbps = attempt.audio_kbps,
            "Encode attempt"
        );
        metrics::counter!("vidmill_compose_encode_attempts_total").increment(1);

        let cmd = build_encode_command(bg_path, fg_path, audio_path, output_path, &plan, params, attempt.video_kbps, attempt.audio_kbps);
        runner.run(&cmd).await?;

        let size_mb = file_size_mb(output_path)?;

        match search.observe(size_mb) {
            Verdict::Accept => {
                info!(
                    attempt = attempt.index,
                    size_mb = format!("{:.2}", size_mb),
                    output = %output_path.display(),
                    "Composition complete"
                );
                return Ok(output_path.to_path_buf());
            }
            Verdict::Retry { next_total_kbps } => {
                warn!(
                    attempt = attempt.index,
                    size_mb = format!("{:.2}", size_mb),
                    max_output_mb = search_params.max_output_size_mb,
                    total_kbps = attempt.total_kbps,
                    next_total_kbps,
                    "Encode oversize, retrying at lower total bitrate"
                );
            }
            Verdict::Fail(err) => {
                metrics::counter!("vidmill_compose_budget_failures_total").increment(1);
                return Err(err);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_encode_command(
    bg_path: &Path,
    fg_path: &Path,
    audio_path: &Path,
    output_path: &Path,
    plan: &ComposePlan,
    params: &CompositionParams,
    video_kbps: u32,
    audio_kbps: u32,
) -> FfmpegCommand {
    FfmpegCommand::new(output_path)
        .input(bg_path)
        .input(fg_path)
        .input(audio_path)
        .filter_complex(plan.filter_graph.clone())
        .map("[vout]")
        // Sole audio is the synthesized track; apad fills with silence
        // when it ends before the target duration.
        .map("2:a?")
        .output_args(["-af", "apad"])
        .duration(plan.target_duration)
        .output_args(["-fps_mode", "cfr"])
        .output_args(["-r", &format!("{:.6}", plan.bg_fps)])
        .video_codec("libx264")
        .preset(params.x264_preset.clone())
        .crf(params.x264_crf)
        .output_args(["-b:v", &format!("{}k", video_kbps)])
        .output_args(["-maxrate", &format!("{}k", video_kbps)])
        .output_args(["-bufsize", &format!("{}k", video_kbps * 2)])
        .audio_codec("aac")
        .output_args(["-b:a", &format!("{}k", audio_kbps)])
        .output_args(["-movflags", "+faststart"])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(duration: f64, fps: f64, bitrate_kbps: u32) -> MediaInfo {
        MediaInfo {
            duration,
            width: 1080,
            height: 1920,
            fps,
            size: 0,
            bitrate_kbps,
        }
    }

    fn scenario_params() -> CompositionParams {
        CompositionParams {
            target_total_bitrate_mbps: 0.6,
            min_total_bitrate_mbps: 0.35,
            bitrate_step_kbps: 50,
            max_output_size_mb: 30,
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_target_duration_is_foreground() {
        let bg = info(12.0, 30.0, 2500);
        let plan = plan_composition(
            &bg,
            Path::new("bg.mp4"),
            8.0,
            Path::new("fg.mp4"),
            &scenario_params(),
        )
        .unwrap();
        assert!((plan.target_duration - 8.0).abs() < 1e-9);
        assert!((plan.bg_remap_factor - 0.6667).abs() < 1e-3);
        assert!((plan.bg_fps - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_rejects_zero_durations() {
        let params = scenario_params();
        let bg = info(0.0, 30.0, 0);
        assert!(matches!(
            plan_composition(&bg, Path::new("bg.mp4"), 8.0, Path::new("fg.mp4"), &params),
            Err(MediaError::DurationZero(_))
        ));

        let bg = info(12.0, 30.0, 0);
        assert!(matches!(
            plan_composition(&bg, Path::new("bg.mp4"), 0.0, Path::new("fg.mp4"), &params),
            Err(MediaError::DurationZero(_))
        ));
    }

    /// End-to-end planning scenario: 12s background, 8s foreground, 30MB
    /// budget, 600 kbps fallback, 350 minimum, 50 step.
    #[test]
    fn test_scenario_plan_and_first_retry() {
        let params = scenario_params();
        let bg = info(12.0, 25.0, 2000);
        let plan = plan_composition(&bg, Path::new("bg.mp4"), 8.0, Path::new("fg.mp4"), &params)
            .unwrap();

        assert!((plan.target_duration - 8.0).abs() < 1e-9);
        assert!((plan.bg_remap_factor - 0.666667).abs() < 1e-4);

        let mut search = BitrateSearch::new(plan.bg_bitrate_kbps, params.search_params());
        let first = search.attempt();
        assert!(first.total_kbps >= 600);
        assert_eq!(first.total_kbps, 2000);

        // Oversized first attempt jumps exactly to the fallback target,
        // not a stepped value.
        match search.observe(42.0) {
            Verdict::Retry { next_total_kbps } => assert_eq!(next_total_kbps, 600),
            other => panic!("expected retry at fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_command_shape() {
        let params = scenario_params();
        let bg = info(12.0, 25.0, 2000);
        let plan = plan_composition(&bg, Path::new("bg.mp4"), 8.0, Path::new("fg.mp4"), &params)
            .unwrap();

        let cmd = build_encode_command(
            Path::new("bg.mp4"),
            Path::new("fg.mp4"),
            Path::new("voice.mp3"),
            Path::new("out.mp4"),
            &plan,
            &params,
            536,
            64,
        );
        let args = cmd.build_args();

        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 3);
        assert!(args.contains(&"apad".to_string()));
        assert!(args.contains(&"8.000".to_string()));
        assert!(args.contains(&"536k".to_string()));
        assert!(args.contains(&"1072k".to_string()));
        assert!(args.contains(&"64k".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert!(args.contains(&"cfr".to_string()));
    }
}
