//! Mishran Render Engine
//!
//! Turns an edit-decision list into a rendered video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! cam1.mkv ──┐
//! cam2.mkv ──┼── trim/fps/zoom-crop/scale per clip ── concat ──┐
//! camN.mkv ──┘                                                 ├── Encode (H.264 + AAC)
//! host_audio.mkv ──────────── atrim to edit length ────────────┘         │
//!                                                                        ▼
//!                                                              final_output.mp4
//!                                                                        │
//!                                                                  refine (grade)
//!                                                                        ▼
//!                                                             refined_output.mp4
//! ```

pub mod compiler;
pub mod export;
pub mod filter_graph;
pub mod refine;
pub mod zoom;

pub use compiler::{CompileConfig, CompiledEdit, FilterGraphCompiler};
pub use export::*;
pub use filter_graph::{Filter, FilterChain, FilterGraphSpec, StreamLabel};
pub use refine::{refine, RefineJob};
pub use zoom::{total_frames, ZoomCurve};
