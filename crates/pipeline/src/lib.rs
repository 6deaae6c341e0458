//! Mishran Pipeline
//!
//! The full assembly run, from a recordings directory to a rendered edit.
//! Every external collaborator sits behind a trait so runs can be planned
//! and tested without ffmpeg or the scoring service.

pub mod pipeline;
pub mod session;

pub use pipeline::{AssemblyPlan, Pipeline};
pub use session::{FixedSession, RecordingsDirProvider, SessionProvider};
