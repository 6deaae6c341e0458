//! Silence segmentation: the "Pause-to-Shot" algorithm.
//!
//! Splits the reference audio into shots whose boundaries land on natural
//! pauses in speech.
//!
//! # Algorithm
//!
//! 1. **Classify** the waveform into speech intervals: frame RMS in dB
//!    relative to the loudest frame, speech above `-top_db`.
//! 2. **Candidates**: the end of every speech interval (`PauseEnd`) or the
//!    center of every gap between intervals (`PauseCenter`), plus the track end.
//! 3. **Merge** candidates into shots:
//!    - *Sweep*: accept a candidate only if the shot it closes is at least
//!      `min_duration` long; a short remainder extends the last shot.
//!    - *Bounded window*: from the current cut, take the earliest candidate in
//!      `[pos + min_duration, pos + max_shot]`, else force a cut at `pos + max_shot`.
//! 4. **Fallback**: any failure yields a fixed run of equal-length shots,
//!    reported as a degraded outcome.

use mishran_common::config::{CutStrategy, SegmentationDefaults};
use mishran_common::error::{MishranError, MishranResult};
use mishran_edit_model::audio::Waveform;
use mishran_edit_model::outcome::Outcome;
use mishran_edit_model::segment::{validate_segments, Segment, SpeechInterval, TIME_EPSILON};

/// Power floor used when converting frame energy to decibels.
const AMIN: f64 = 1e-10;

/// Configuration for the silence segmenter.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Frames quieter than the loudest frame by more than this many dB are silence.
    /// Lower values treat quieter pauses as silence and produce more shots.
    pub top_db: f64,

    /// Analysis window length in samples.
    pub frame_length: usize,

    /// Hop between analysis windows in samples.
    pub hop_length: usize,

    /// Shortest allowed shot (seconds).
    pub min_duration_secs: f64,

    /// Longest allowed shot (seconds). `Some` selects the bounded-window policy.
    pub max_shot_duration_secs: Option<f64>,

    /// Where cut candidates are placed.
    pub cut_strategy: CutStrategy,

    /// Number of shots in the fallback sequence.
    pub fallback_segment_count: usize,

    /// Length of each fallback shot (seconds).
    pub fallback_segment_secs: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self::from(&SegmentationDefaults::default())
    }
}

impl From<&SegmentationDefaults> for SegmenterConfig {
    fn from(defaults: &SegmentationDefaults) -> Self {
        Self {
            top_db: defaults.top_db,
            frame_length: defaults.frame_length,
            hop_length: defaults.hop_length,
            min_duration_secs: defaults.min_duration_secs,
            max_shot_duration_secs: defaults.max_shot_duration_secs,
            cut_strategy: defaults.cut_strategy,
            fallback_segment_count: defaults.fallback_segment_count,
            fallback_segment_secs: defaults.fallback_segment_secs,
        }
    }
}

impl SegmenterConfig {
    /// The merge policy implied by this configuration.
    pub fn merge_policy(&self) -> MergePolicy {
        match self.max_shot_duration_secs {
            Some(max_shot_secs) => MergePolicy::BoundedWindow { max_shot_secs },
            None => MergePolicy::Sweep,
        }
    }

    /// Reject settings no track could be segmented with.
    pub fn validate(&self) -> MishranResult<()> {
        if self.frame_length == 0 || self.hop_length == 0 {
            return Err(MishranError::config(
                "frame_length and hop_length must be positive",
            ));
        }
        if !self.top_db.is_finite() || self.top_db <= 0.0 {
            return Err(MishranError::config(format!(
                "top_db must be positive, got {}",
                self.top_db
            )));
        }
        if !self.min_duration_secs.is_finite() || self.min_duration_secs <= 0.0 {
            return Err(MishranError::config(format!(
                "min_duration must be positive, got {}",
                self.min_duration_secs
            )));
        }
        if let Some(max) = self.max_shot_duration_secs {
            if !max.is_finite() || max < self.min_duration_secs {
                return Err(MishranError::config(format!(
                    "max_shot_duration ({max}) must be at least min_duration ({})",
                    self.min_duration_secs
                )));
            }
        }
        Ok(())
    }
}

/// How cut candidates are merged into shots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergePolicy {
    /// Accept candidates in order once the shot reaches the minimum length.
    Sweep,
    /// Greedy earliest candidate within a bounded window, forced cut otherwise.
    BoundedWindow { max_shot_secs: f64 },
}

/// The silence segmenter.
pub struct SilenceSegmenter {
    config: SegmenterConfig,
}

impl SilenceSegmenter {
    /// Create a new segmenter with the given configuration.
    ///
    /// The configuration is expected to have passed [`SegmenterConfig::validate`].
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Create a segmenter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SegmenterConfig::default())
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment a waveform. Never fails: errors degrade to the fallback sequence.
    pub fn segment(&self, waveform: &Waveform) -> Outcome<Vec<Segment>> {
        match self.try_segment(waveform) {
            Ok(segments) => {
                tracing::info!(
                    segments = segments.len(),
                    duration_secs = waveform.duration_secs(),
                    strategy = ?self.config.cut_strategy,
                    policy = ?self.config.merge_policy(),
                    "Generated audio-driven segments"
                );
                Outcome::complete(segments)
            }
            Err(e) => self.fallback(e.to_string()),
        }
    }

    /// The fallback outcome for a failure that happened before a waveform existed.
    pub fn fallback(&self, reason: impl Into<String>) -> Outcome<Vec<Segment>> {
        let reason = reason.into();
        let segments = self.fallback_segments();
        tracing::warn!(
            reason = %reason,
            segments = segments.len(),
            segment_secs = self.config.fallback_segment_secs,
            "Audio analysis failed, using fixed fallback segments"
        );
        Outcome::degraded(segments, reason)
    }

    /// Segment a waveform, reporting failures instead of falling back.
    pub fn try_segment(&self, waveform: &Waveform) -> MishranResult<Vec<Segment>> {
        let intervals = self.classify(waveform)?;
        let total = waveform.duration_secs();
        tracing::debug!(
            intervals = intervals.len(),
            total_secs = total,
            "Classified speech intervals"
        );

        let segments = segment_intervals(&intervals, total, &self.config);
        validate_segments(&segments, Some(total))
            .map_err(|e| MishranError::segmentation(format!("invalid segmentation: {e}")))?;
        Ok(segments)
    }

    /// Classify a waveform into ordered, non-overlapping speech intervals.
    pub fn classify(&self, waveform: &Waveform) -> MishranResult<Vec<SpeechInterval>> {
        if waveform.sample_rate == 0 {
            return Err(MishranError::segmentation("sample rate is zero"));
        }
        if waveform.is_empty() {
            return Err(MishranError::segmentation("waveform has no samples"));
        }
        if waveform.samples.iter().any(|s| !s.is_finite()) {
            return Err(MishranError::segmentation(
                "waveform contains non-finite samples",
            ));
        }
        if self.config.frame_length == 0 || self.config.hop_length == 0 {
            return Err(MishranError::segmentation("analysis window is empty"));
        }

        let speech = speech_frames(
            &waveform.samples,
            self.config.frame_length,
            self.config.hop_length,
            self.config.top_db,
        );

        let n_samples = waveform.samples.len();
        let hop = self.config.hop_length;
        let mut intervals = vec![];
        let mut run_start: Option<usize> = None;

        for (frame, is_speech) in speech.iter().chain(std::iter::once(&false)).enumerate() {
            match (run_start, *is_speech) {
                (None, true) => run_start = Some(frame),
                (Some(first), false) => {
                    let start = (first * hop).min(n_samples);
                    let end = (frame * hop).min(n_samples);
                    if start < end {
                        intervals.push(SpeechInterval::new(
                            waveform.samples_to_secs(start),
                            waveform.samples_to_secs(end),
                        ));
                    }
                    run_start = None;
                }
                _ => {}
            }
        }

        Ok(intervals)
    }

    /// Fixed deterministic sequence used when analysis fails.
    pub fn fallback_segments(&self) -> Vec<Segment> {
        let count = self.config.fallback_segment_count.max(1);
        let length = if self.config.fallback_segment_secs.is_finite()
            && self.config.fallback_segment_secs > 0.0
        {
            self.config.fallback_segment_secs
        } else {
            SegmentationDefaults::default().fallback_segment_secs
        };

        (0..count)
            .map(|i| Segment::new(i as f64 * length, (i + 1) as f64 * length))
            .collect()
    }
}

/// Per-frame speech flags for a centered, zero-padded RMS analysis.
///
/// Frame `i` is centered on sample `i * hop_length`; there are
/// `1 + len / hop_length` frames.
fn speech_frames(samples: &[f32], frame_length: usize, hop_length: usize, top_db: f64) -> Vec<bool> {
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for s in samples {
        acc += (*s as f64) * (*s as f64);
        prefix.push(acc);
    }

    let n = samples.len();
    let n_frames = 1 + n / hop_length;
    let half = frame_length / 2;

    let powers: Vec<f64> = (0..n_frames)
        .map(|i| {
            let center = i * hop_length;
            let lo = center.saturating_sub(half).min(n);
            let hi = (center + frame_length - half).min(n);
            (prefix[hi] - prefix[lo]).max(0.0) / frame_length as f64
        })
        .collect();

    let reference = powers.iter().copied().fold(0.0f64, f64::max);
    if reference <= AMIN {
        return vec![false; n_frames];
    }

    let ref_db = 10.0 * reference.log10();
    powers
        .iter()
        .map(|p| 10.0 * p.max(AMIN).log10() - ref_db > -top_db)
        .collect()
}

/// Cut candidates for the given strategy, sorted, deduplicated, and ending at `total`.
pub fn cut_candidates(intervals: &[SpeechInterval], total: f64, strategy: CutStrategy) -> Vec<f64> {
    let mut candidates: Vec<f64> = match strategy {
        CutStrategy::PauseEnd => intervals.iter().map(|iv| iv.end).collect(),
        CutStrategy::PauseCenter => intervals
            .windows(2)
            .map(|pair| (pair[0].end + pair[1].start) / 2.0)
            .collect(),
    };
    candidates.push(total);

    candidates.retain(|t| t.is_finite() && *t > 0.0 && *t <= total);
    candidates.sort_by(f64::total_cmp);
    candidates.dedup_by(|a, b| (*a - *b).abs() < TIME_EPSILON);
    candidates
}

/// Candidate generation and merging for already-classified intervals.
pub fn segment_intervals(
    intervals: &[SpeechInterval],
    total: f64,
    config: &SegmenterConfig,
) -> Vec<Segment> {
    let candidates = cut_candidates(intervals, total, config.cut_strategy);
    match config.merge_policy() {
        MergePolicy::Sweep => sweep_merge(&candidates, total, config.min_duration_secs),
        MergePolicy::BoundedWindow { max_shot_secs } => bounded_window_merge(
            &candidates,
            total,
            config.min_duration_secs,
            max_shot_secs,
        ),
    }
}

/// Simple sweep: accept a candidate once the shot it closes reaches `min_duration`.
pub fn sweep_merge(candidates: &[f64], total: f64, min_duration: f64) -> Vec<Segment> {
    let mut segments: Vec<Segment> = vec![];
    let mut last_cut = 0.0;

    for &t in candidates {
        if t <= last_cut {
            continue;
        }
        if t - last_cut >= min_duration {
            segments.push(Segment::new(last_cut, t));
            last_cut = t;
        }
    }

    if last_cut < total {
        match segments.last_mut() {
            Some(last) => last.end = total,
            None => segments.push(Segment::new(0.0, total)),
        }
    }

    segments
}

/// Bounded greedy window: earliest candidate in `[pos + min, pos + max]`, else a forced cut.
pub fn bounded_window_merge(
    candidates: &[f64],
    total: f64,
    min_duration: f64,
    max_shot: f64,
) -> Vec<Segment> {
    let mut segments = vec![];
    if !total.is_finite() || total <= 0.0 || max_shot.is_nan() || max_shot <= 0.0 {
        return segments;
    }

    let mut pos = 0.0;
    let mut next = 0usize;

    while pos < total {
        while next < candidates.len() && candidates[next] - pos < min_duration {
            next += 1;
        }

        let natural = candidates
            .get(next)
            .copied()
            .filter(|c| *c - pos <= max_shot);

        let mut cut = match natural {
            Some(c) => c,
            None => {
                let forced = (pos + max_shot).min(total);
                tracing::debug!(pos, forced, "No pause inside window, forcing cut");
                forced
            }
        };
        if total - cut < TIME_EPSILON {
            cut = total;
        }

        segments.push(Segment::new(pos, cut));
        pos = cut;
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intervals(bounds: &[(f64, f64)]) -> Vec<SpeechInterval> {
        bounds
            .iter()
            .map(|(s, e)| SpeechInterval::new(*s, *e))
            .collect()
    }

    fn bounds(segments: &[Segment]) -> Vec<(f64, f64)> {
        segments.iter().map(|s| (s.start, s.end)).collect()
    }

    /// 440 Hz tone everywhere except the given silent ranges (seconds).
    fn tone_with_gaps(total_secs: f64, sample_rate: u32, gaps: &[(f64, f64)]) -> Waveform {
        let n = (total_secs * sample_rate as f64).round() as usize;
        let samples = (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                if gaps.iter().any(|(a, b)| t >= *a && t < *b) {
                    0.0
                } else {
                    (0.5 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as f32
                }
            })
            .collect();
        Waveform::new(samples, sample_rate)
    }

    #[test]
    fn test_pause_center_candidates() {
        let ivs = intervals(&[(0.0, 5.5), (6.5, 12.5), (13.5, 20.0)]);
        let candidates = cut_candidates(&ivs, 20.0, CutStrategy::PauseCenter);
        assert_eq!(candidates, vec![6.0, 13.0, 20.0]);
    }

    #[test]
    fn test_pause_end_candidates_dedup_terminal() {
        let ivs = intervals(&[(0.0, 5.5), (6.5, 12.5), (13.5, 20.0)]);
        let candidates = cut_candidates(&ivs, 20.0, CutStrategy::PauseEnd);
        assert_eq!(candidates, vec![5.5, 12.5, 20.0]);
    }

    #[test]
    fn test_sweep_gap_midpoints_scenario() {
        let ivs = intervals(&[(0.0, 5.5), (6.5, 12.5), (13.5, 20.0)]);
        let config = SegmenterConfig {
            cut_strategy: CutStrategy::PauseCenter,
            min_duration_secs: 3.0,
            ..Default::default()
        };
        let segments = segment_intervals(&ivs, 20.0, &config);
        assert_eq!(bounds(&segments), vec![(0.0, 6.0), (6.0, 13.0), (13.0, 20.0)]);
    }

    #[test]
    fn test_sweep_skips_candidates_closer_than_min() {
        let segments = sweep_merge(&[1.0, 2.0, 4.0, 5.0, 9.0, 10.0], 10.0, 3.0);
        assert_eq!(bounds(&segments), vec![(0.0, 4.0), (4.0, 10.0)]);
    }

    #[test]
    fn test_sweep_short_track_is_one_segment() {
        let segments = sweep_merge(&[2.0], 2.0, 3.0);
        assert_eq!(bounds(&segments), vec![(0.0, 2.0)]);
    }

    #[test]
    fn test_bounded_window_prefers_earliest_candidate() {
        let segments = bounded_window_merge(&[2.0, 4.0, 6.0, 20.0], 20.0, 3.0, 8.0);
        assert_eq!(segments[0], Segment::new(0.0, 4.0));
        assert_eq!(segments[1], Segment::new(4.0, 12.0));
        assert_eq!(segments[2], Segment::new(12.0, 20.0));
    }

    #[test]
    fn test_bounded_window_forces_cut_without_pauses() {
        let segments = bounded_window_merge(&[25.0], 25.0, 3.0, 10.0);
        assert_eq!(
            bounds(&segments),
            vec![(0.0, 10.0), (10.0, 20.0), (20.0, 25.0)]
        );
    }

    #[test]
    fn test_silent_track_is_single_segment() {
        let segmenter = SilenceSegmenter::with_defaults();
        let waveform = Waveform::new(vec![0.0; 22050 * 8], 22050);
        let outcome = segmenter.segment(&waveform);
        assert!(!outcome.is_degraded());
        assert_eq!(bounds(outcome.value()), vec![(0.0, 8.0)]);
    }

    #[test]
    fn test_classify_finds_gaps_in_tone() {
        let waveform = tone_with_gaps(10.0, 8000, &[(4.0, 5.0)]);
        let segmenter = SilenceSegmenter::new(SegmenterConfig {
            frame_length: 512,
            hop_length: 128,
            ..Default::default()
        });
        let ivs = segmenter.classify(&waveform).unwrap();
        assert_eq!(ivs.len(), 2);
        assert!((ivs[0].end - 4.0).abs() < 0.1);
        assert!((ivs[1].start - 5.0).abs() < 0.1);
        assert!((ivs[1].end - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_waveform_degrades_to_fallback() {
        let segmenter = SilenceSegmenter::with_defaults();
        let outcome = segmenter.segment(&Waveform::new(vec![], 22050));
        assert!(outcome.is_degraded());
        assert_eq!(
            bounds(outcome.value()),
            vec![(0.0, 5.0), (5.0, 10.0), (10.0, 15.0)]
        );
    }

    #[test]
    fn test_max_shot_below_min_is_config_error() {
        let config = SegmenterConfig {
            max_shot_duration_secs: Some(2.0),
            min_duration_secs: 3.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_setup_failure());
        assert!(err.to_string().contains("max_shot_duration"));
    }

    #[test]
    fn test_invalid_analysis_settings_are_config_errors() {
        for config in [
            SegmenterConfig {
                hop_length: 0,
                ..Default::default()
            },
            SegmenterConfig {
                top_db: 0.0,
                ..Default::default()
            },
            SegmenterConfig {
                min_duration_secs: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                config.validate(),
                Err(MishranError::Config { .. })
            ));
        }
        assert!(SegmenterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_valid_window_covers_long_track() {
        let segmenter = SilenceSegmenter::new(SegmenterConfig {
            max_shot_duration_secs: Some(10.0),
            min_duration_secs: 3.0,
            frame_length: 512,
            hop_length: 128,
            ..Default::default()
        });
        let outcome = segmenter.segment(&tone_with_gaps(60.0, 8000, &[]));
        assert!(!outcome.is_degraded());
        let segments = outcome.value();
        assert_eq!(segments.len(), 6);
        assert!((segments[5].end - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_samples_are_rejected() {
        let segmenter = SilenceSegmenter::with_defaults();
        let waveform = Waveform::new(vec![0.1, f32::NAN, 0.2], 8000);
        assert!(segmenter.try_segment(&waveform).is_err());
    }
}
