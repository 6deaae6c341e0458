//! Zoom motion curves for wide and tight clips.
//!
//! `n` is the 0-based output frame number inside a clip.
//!
//! - **Wide:** `z(n) = 1.0 + 0.04 * n / total`
//! - **Tight:** `z(n) = 1.0 + 0.1 * n / ramp` up to `ramp`, then
//!   `z(n) = 1.1 + 0.05 * (n - ramp) / total`

use mishran_edit_model::edl::ZoomState;
use serde::Serialize;

/// Total zoom gained by a wide clip over its length.
pub const WIDE_CREEP: f64 = 0.04;

/// Zoom gained by a tight clip during its punch-in ramp.
pub const TIGHT_PUNCH: f64 = 0.1;

/// Zoom gained by a tight clip after the ramp, over its length.
pub const TIGHT_CREEP: f64 = 0.05;

/// Frames in a clip of `duration_secs` at `fps`, rounded, never below 1.
pub fn total_frames(duration_secs: f64, fps: u32) -> u64 {
    let frames = (duration_secs * fps as f64).round();
    if frames.is_finite() && frames >= 1.0 {
        frames as u64
    } else {
        1
    }
}

/// The zoom factor of one clip as a function of its frame number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomCurve {
    pub state: ZoomState,
    pub total_frames: u64,
    pub ramp_frames: u32,
}

impl ZoomCurve {
    pub fn new(state: ZoomState, total_frames: u64, ramp_frames: u32) -> Self {
        Self {
            state,
            total_frames: total_frames.max(1),
            ramp_frames: ramp_frames.max(1),
        }
    }

    /// Zoom factor at frame `n`.
    pub fn factor_at(&self, n: u64) -> f64 {
        let n = n as f64;
        let total = self.total_frames as f64;
        let ramp = self.ramp_frames as f64;
        match self.state {
            ZoomState::Wide => 1.0 + WIDE_CREEP * n / total,
            ZoomState::Tight if n <= ramp => 1.0 + TIGHT_PUNCH * n / ramp,
            ZoomState::Tight => 1.0 + TIGHT_PUNCH + TIGHT_CREEP * (n - ramp) / total,
        }
    }

    /// The same curve as an ffmpeg expression in `n`.
    pub fn expression(&self) -> String {
        let total = self.total_frames;
        let ramp = self.ramp_frames;
        match self.state {
            ZoomState::Wide => format!("(1.0+{WIDE_CREEP}*n/{total})"),
            ZoomState::Tight => format!(
                "if(lte(n,{ramp}),1.0+{TIGHT_PUNCH}*n/{ramp},{peak}+{TIGHT_CREEP}*(n-{ramp})/{total})",
                peak = 1.0 + TIGHT_PUNCH,
            ),
        }
    }
}
