//! Mishran AI Director
//!
//! Picks a camera for every shot:
//! - **Frames:** one still per camera at each shot's midpoint
//! - **Oracle:** an external HTTP service that names the winning camera
//! - **Scorer:** per-shot isolation; any failure falls back to camera 1

pub mod error;
pub mod frames;
pub mod oracle;
pub mod scorer;

pub use error::{DirectorError, DirectorResult};
pub use frames::{FfmpegFrameExtractor, FrameExtractor};
pub use oracle::{
    parse_winner_id, CandidateFrame, HttpScoringOracle, OracleConfig, ScoreRequest, ScoringOracle,
};
pub use scorer::{ScoreReport, ScorerConfig, SegmentDecision, SegmentScorer};
