//! Mishran Edit Model
//!
//! Defines the data contracts that flow through the assembly pipeline:
//! - **Waveform:** Decoded mono samples of the reference audio
//! - **Segments:** Speech intervals and the shot boundaries derived from them
//! - **Decisions:** Winning camera per shot, keyed by shot index
//! - **Edit-decision list:** Resolved clips with their zoom profile
//! - **Session:** The camera files and reference audio of one recording
//!
//! All times are seconds on the reference audio timeline. Camera ids are
//! 1-based; source indices into the camera list are 0-based.

pub mod audio;
pub mod decision;
pub mod edl;
pub mod outcome;
pub mod segment;
pub mod session;

pub use audio::*;
pub use decision::*;
pub use edl::*;
pub use outcome::*;
pub use segment::*;
pub use session::*;
