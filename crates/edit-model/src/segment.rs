//! Speech intervals and shot segments.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing boundaries that were computed separately.
pub const TIME_EPSILON: f64 = 1e-9;

/// A contiguous region of the reference audio classified as non-silent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechInterval {
    /// Start time (seconds).
    pub start: f64,
    /// End time (seconds). Always greater than `start`.
    pub end: f64,
}

impl SpeechInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// A shot boundary on the final edit's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time (seconds), inclusive.
    pub start: f64,
    /// End time (seconds), exclusive.
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Temporal midpoint, where representative stills are sampled.
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Violations of the segment sequence contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SegmentError {
    #[error("no segments")]
    Empty,

    #[error("segment {index} is empty or reversed ({start} >= {end})")]
    NonPositive { index: usize, start: f64, end: f64 },

    #[error("gap or overlap between segment {index} (end {end}) and the next (start {next_start})")]
    Discontinuous {
        index: usize,
        end: f64,
        next_start: f64,
    },

    #[error("sequence does not start at 0 (starts at {start})")]
    BadStart { start: f64 },

    #[error("sequence ends at {end}, expected {expected}")]
    BadEnd { end: f64, expected: f64 },
}

/// Check that `segments` are ordered, contiguous, non-empty, and start at zero.
///
/// When `total_duration` is given, the last segment must end exactly there.
pub fn validate_segments(
    segments: &[Segment],
    total_duration: Option<f64>,
) -> Result<(), SegmentError> {
    let first = segments.first().ok_or(SegmentError::Empty)?;
    if first.start.abs() > TIME_EPSILON {
        return Err(SegmentError::BadStart { start: first.start });
    }

    for (index, segment) in segments.iter().enumerate() {
        if !(segment.start < segment.end) {
            return Err(SegmentError::NonPositive {
                index,
                start: segment.start,
                end: segment.end,
            });
        }
    }

    for (index, pair) in segments.windows(2).enumerate() {
        if (pair[0].end - pair[1].start).abs() > TIME_EPSILON {
            return Err(SegmentError::Discontinuous {
                index,
                end: pair[0].end,
                next_start: pair[1].start,
            });
        }
    }

    if let (Some(expected), Some(last)) = (total_duration, segments.last()) {
        if (last.end - expected).abs() > TIME_EPSILON {
            return Err(SegmentError::BadEnd {
                end: last.end,
                expected,
            });
        }
    }

    Ok(())
}
