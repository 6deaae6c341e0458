//! Recording session inputs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The resolved inputs of one recording session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSources {
    /// Opaque session identifier forwarded to the scoring oracle.
    pub session_id: String,
    /// Camera video files; camera id `n` is `cameras[n - 1]`.
    pub cameras: Vec<PathBuf>,
    /// Unedited host audio the edit is synced to.
    pub reference_audio: PathBuf,
}

impl SessionSources {
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    /// Camera file for a 1-based camera id.
    pub fn camera(&self, camera_id: u32) -> Option<&PathBuf> {
        (camera_id as usize)
            .checked_sub(1)
            .and_then(|index| self.cameras.get(index))
    }

    /// First input that is not a regular file: the reference audio, then cameras in order.
    pub fn first_missing_file(&self) -> Option<&Path> {
        std::iter::once(&self.reference_audio)
            .chain(self.cameras.iter())
            .map(PathBuf::as_path)
            .find(|path| !path.is_file())
    }
}
