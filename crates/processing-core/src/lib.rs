//! Mishran Processing Core: the cut planner.
//!
//! Turns a reference waveform into shots and shots plus camera decisions
//! into an edit-decision list:
//! - **Silence segmentation:** place cuts on natural pauses in speech
//! - **Edit planning:** resolve winning cameras and assign zoom profiles
//!
//! This crate is pure computation. No I/O, no external processes.

pub mod edit_plan;
pub mod segmenter;

pub use edit_plan::build_edit_plan;
pub use segmenter::{MergePolicy, SegmenterConfig, SilenceSegmenter};
