//! Bounded bitrate search.
//!
//! The search drives the encoder through a strictly decreasing sequence of
//! total (video+audio) bitrates until the output fits the size budget. It
//! is an explicit state machine: each step yields an [`Attempt`], the
//! caller encodes and reports the observed size, and the search answers
//! with a [`Verdict`]. No exceptions-as-control-flow, no unbounded loops.

use crate::error::MediaError;

/// Hard floor applied to fallback/minimum totals.
const TOTAL_FLOOR_KBPS: u32 = 100;
/// Hard floor for the audio track.
const AUDIO_FLOOR_KBPS: u32 = 32;
/// Headroom reserved for video when clamping the audio share.
const AUDIO_HEADROOM_KBPS: u32 = 100;
/// Hard floor for the video track.
const VIDEO_FLOOR_KBPS: u32 = 100;

/// Search configuration, derived from the composition parameters.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Total bitrate the search jumps to after the first oversized attempt
    /// above it.
    pub fallback_total_kbps: u32,
    /// Lower bound for the total bitrate.
    pub min_total_kbps: u32,
    /// Decrement applied once at or below the fallback.
    pub step_kbps: u32,
    /// Configured audio bitrate, clamped per attempt.
    pub audio_kbps: u32,
    /// Output size budget.
    pub max_output_size_mb: u64,
}

impl SearchParams {
    /// Build from mbps-denominated config values, applying floors.
    pub fn from_config(
        target_total_mbps: f64,
        min_total_mbps: f64,
        step_kbps: u32,
        audio_kbps: u32,
        max_output_size_mb: u64,
    ) -> Self {
        Self {
            fallback_total_kbps: ((target_total_mbps * 1000.0).round() as u32)
                .max(TOTAL_FLOOR_KBPS),
            min_total_kbps: ((min_total_mbps * 1000.0).round() as u32).max(TOTAL_FLOOR_KBPS),
            step_kbps: step_kbps.max(10),
            audio_kbps,
            max_output_size_mb,
        }
    }
}

/// One encode attempt's bitrate split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub index: u32,
    pub total_kbps: u32,
    pub video_kbps: u32,
    pub audio_kbps: u32,
}

/// Outcome of observing an encoded attempt's size.
#[derive(Debug)]
pub enum Verdict {
    /// Output is within budget; the attempt's file is the result.
    Accept,
    /// Oversized; retry at the given lower total.
    Retry { next_total_kbps: u32 },
    /// Oversized and no lower total is available.
    Fail(MediaError),
}

/// Bitrate search state.
#[derive(Debug, Clone)]
pub struct BitrateSearch {
    params: SearchParams,
    total_kbps: u32,
    attempt_index: u32,
}

impl BitrateSearch {
    /// Start a search. The initial total is the larger of the probed
    /// background bitrate and the configured fallback target.
    pub fn new(probed_bg_kbps: u32, params: SearchParams) -> Self {
        Self {
            params,
            total_kbps: probed_bg_kbps.max(params.fallback_total_kbps),
            attempt_index: 0,
        }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Split the current total into the next attempt's video/audio rates.
    ///
    /// Audio is the configured rate clamped between 32 kbps and
    /// `total − 100`; video takes the remainder with a 100 kbps floor.
    pub fn attempt(&self) -> Attempt {
        let ceiling = self
            .total_kbps
            .saturating_sub(AUDIO_HEADROOM_KBPS)
            .max(AUDIO_FLOOR_KBPS);
        let audio_kbps = self.params.audio_kbps.max(AUDIO_FLOOR_KBPS).min(ceiling);
        let video_kbps = self.total_kbps.saturating_sub(audio_kbps).max(VIDEO_FLOOR_KBPS);

        Attempt {
            index: self.attempt_index + 1,
            total_kbps: self.total_kbps,
            video_kbps,
            audio_kbps,
        }
    }

    /// Report the encoded output size for the current attempt.
    pub fn observe(&mut self, size_mb: f64) -> Verdict {
        self.attempt_index += 1;

        if size_mb <= self.params.max_output_size_mb as f64 {
            return Verdict::Accept;
        }

        if self.total_kbps <= self.params.min_total_kbps {
            return Verdict::Fail(MediaError::MinBitrateExceeded {
                size_mb,
                limit_mb: self.params.max_output_size_mb,
                min_total_kbps: self.params.min_total_kbps,
            });
        }

        // Above the fallback target, jump straight to it; large first
        // corrections converge faster than stepping down from a high
        // probed bitrate.
        let next = if self.total_kbps > self.params.fallback_total_kbps {
            self.params.fallback_total_kbps.max(self.params.min_total_kbps)
        } else {
            self.total_kbps
                .saturating_sub(self.params.step_kbps)
                .max(self.params.min_total_kbps)
        };

        if next >= self.total_kbps {
            return Verdict::Fail(MediaError::BudgetExceeded {
                size_mb,
                limit_mb: self.params.max_output_size_mb,
            });
        }

        self.total_kbps = next;
        Verdict::Retry {
            next_total_kbps: next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SearchParams {
        SearchParams {
            fallback_total_kbps: 600,
            min_total_kbps: 350,
            step_kbps: 50,
            audio_kbps: 64,
            max_output_size_mb: 30,
        }
    }

    #[test]
    fn test_initial_total_is_max_of_probed_and_fallback() {
        assert_eq!(BitrateSearch::new(2500, params()).attempt().total_kbps, 2500);
        assert_eq!(BitrateSearch::new(0, params()).attempt().total_kbps, 600);
        assert_eq!(BitrateSearch::new(400, params()).attempt().total_kbps, 600);
    }

    #[test]
    fn test_under_budget_first_attempt_accepts_immediately() {
        let mut search = BitrateSearch::new(2500, params());
        assert!(matches!(search.observe(12.0), Verdict::Accept));
    }

    #[test]
    fn test_oversize_above_fallback_jumps_to_fallback() {
        let mut search = BitrateSearch::new(2500, params());
        match search.observe(45.0) {
            Verdict::Retry { next_total_kbps } => assert_eq!(next_total_kbps, 600),
            other => panic!("expected retry, got {:?}", other),
        }
    }

    #[test]
    fn test_oversize_at_fallback_steps_down() {
        let mut search = BitrateSearch::new(0, params());
        match search.observe(31.0) {
            Verdict::Retry { next_total_kbps } => assert_eq!(next_total_kbps, 550),
            other => panic!("expected retry, got {:?}", other),
        }
    }

    #[test]
    fn test_sequence_strictly_decreasing_and_bounded() {
        let p = params();
        let mut search = BitrateSearch::new(3000, p);
        let mut totals = vec![search.attempt().total_kbps];

        loop {
            match search.observe(100.0) {
                Verdict::Retry { next_total_kbps } => {
                    assert!(next_total_kbps < *totals.last().unwrap());
                    assert!(next_total_kbps >= p.min_total_kbps);
                    totals.push(next_total_kbps);
                }
                Verdict::Fail(MediaError::MinBitrateExceeded { .. }) => break,
                other => panic!("unexpected verdict {:?}", other),
            }
        }

        // Jump to fallback, then (600 - 350) / 50 steps, each a new attempt.
        let bound = ((3000 - p.min_total_kbps) as f64 / p.step_kbps as f64).ceil() as usize + 1;
        assert!(totals.len() <= bound);
        assert_eq!(*totals.last().unwrap(), p.min_total_kbps);
    }

    #[test]
    fn test_min_bitrate_exceeded_at_floor() {
        let mut search = BitrateSearch::new(0, params());
        // Walk down to the minimum.
        loop {
            match search.observe(100.0) {
                Verdict::Retry { next_total_kbps } if next_total_kbps == 350 => break,
                Verdict::Retry { .. } => continue,
                other => panic!("unexpected verdict {:?}", other),
            }
        }
        assert!(matches!(
            search.observe(100.0),
            Verdict::Fail(MediaError::MinBitrateExceeded { .. })
        ));
    }

    #[test]
    fn test_min_equals_fallback_fails_after_jump() {
        // min == fallback and a probed rate above both: the jump lands on
        // the fallback, after which no decrease is possible.
        let p = SearchParams {
            fallback_total_kbps: 500,
            min_total_kbps: 500,
            step_kbps: 50,
            audio_kbps: 64,
            max_output_size_mb: 10,
        };
        let mut search = BitrateSearch::new(800, p);
        assert!(matches!(search.observe(50.0), Verdict::Retry { next_total_kbps: 500 }));
        assert!(matches!(
            search.observe(50.0),
            Verdict::Fail(MediaError::MinBitrateExceeded { .. })
        ));
    }

    #[test]
    fn test_audio_split_clamped() {
        let p = SearchParams {
            audio_kbps: 320,
            ..params()
        };
        let search = BitrateSearch::new(0, p);
        let attempt = search.attempt();
        // 600 total: audio capped at total - 100.
        assert_eq!(attempt.audio_kbps, 500);
        assert_eq!(attempt.video_kbps, 100);
    }

    #[test]
    fn test_audio_floor() {
        let p = SearchParams {
            audio_kbps: 8,
            ..params()
        };
        let attempt = BitrateSearch::new(0, p).attempt();
        assert_eq!(attempt.audio_kbps, 32);
        assert_eq!(attempt.video_kbps, 568);
    }

    #[test]
    fn test_attempt_indices_increment() {
        let mut search = BitrateSearch::new(3000, params());
        assert_eq!(search.attempt().index, 1);
        search.observe(100.0);
        assert_eq!(search.attempt().index, 2);
    }
}
