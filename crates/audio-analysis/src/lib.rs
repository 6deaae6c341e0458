//! Mishran Audio Analysis
//!
//! Reads the host's reference audio and finds where the cuts go:
//! - **Decoding:** the transcoder turns any container into mono f32 PCM
//! - **Cut analysis:** pause-driven segmentation with a deterministic fallback

pub mod analysis;
pub mod decode;

pub use analysis::{AudioAnalysis, AudioAnalyzer, CutAnalyzer};
pub use decode::load_waveform;
