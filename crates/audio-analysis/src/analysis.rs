//! Cut analysis over the reference audio.

use std::path::Path;

use mishran_common::error::{MishranError, MishranResult};
use mishran_edit_model::outcome::Outcome;
use mishran_edit_model::segment::Segment;
use mishran_processing_core::segmenter::{SegmenterConfig, SilenceSegmenter};
use serde::Serialize;

use crate::decode::load_waveform;

/// Result of analysing one reference track.
#[derive(Debug, Clone, Serialize)]
pub struct AudioAnalysis {
    /// Shots, possibly the fallback sequence.
    pub segments: Outcome<Vec<Segment>>,

    /// Decoded track length, when decoding succeeded.
    pub duration_secs: Option<f64>,
}

/// Produces shots for a reference track. Implementations never fail.
pub trait CutAnalyzer: Send + Sync {
    fn analyze(&self, path: &Path) -> AudioAnalysis;

    /// The fallback used when analysis cannot run at all.
    fn fallback(&self, reason: String) -> AudioAnalysis;
}

/// Decodes reference audio with ffmpeg and segments it.
pub struct AudioAnalyzer {
    segmenter: SilenceSegmenter,
    sample_rate: u32,
}

impl AudioAnalyzer {
    /// Fails on settings that would make every track fall back.
    pub fn new(config: SegmenterConfig, sample_rate: u32) -> MishranResult<Self> {
        config.validate()?;
        if sample_rate == 0 {
            return Err(MishranError::config("analysis sample rate must be positive"));
        }
        Ok(Self {
            segmenter: SilenceSegmenter::new(config),
            sample_rate,
        })
    }
}

impl CutAnalyzer for AudioAnalyzer {
    fn analyze(&self, path: &Path) -> AudioAnalysis {
        tracing::info!(
            path = %path.display(),
            min_duration_secs = self.segmenter.config().min_duration_secs,
            max_shot_secs = ?self.segmenter.config().max_shot_duration_secs,
            "Analyzing audio for natural pauses"
        );

        match load_waveform(path, self.sample_rate) {
            Ok(waveform) => AudioAnalysis {
                duration_secs: Some(waveform.duration_secs()),
                segments: self.segmenter.segment(&waveform),
            },
            Err(e) => self.fallback(e.to_string()),
        }
    }

    fn fallback(&self, reason: String) -> AudioAnalysis {
        AudioAnalysis {
            segments: self.segmenter.fallback(reason),
            duration_secs: None,
        }
    }
}
