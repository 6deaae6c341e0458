//! Per-shot camera decisions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Camera used whenever no valid decision exists.
pub const DEFAULT_CAMERA: u32 = 1;

/// Winning camera per segment.
///
/// Keys are 0-based segment indices; values are 1-based camera ids.
/// A missing entry means [`DEFAULT_CAMERA`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerMap {
    winners: BTreeMap<usize, u32>,
}

impl WinnerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the winner for a segment, replacing any earlier entry.
    pub fn insert(&mut self, segment_index: usize, camera_id: u32) {
        self.winners.insert(segment_index, camera_id);
    }

    /// The raw recorded winner, if any.
    pub fn get(&self, segment_index: usize) -> Option<u32> {
        self.winners.get(&segment_index).copied()
    }

    /// The winner for a segment, defaulting to camera 1.
    pub fn winner_for(&self, segment_index: usize) -> u32 {
        self.get(segment_index).unwrap_or(DEFAULT_CAMERA)
    }

    pub fn len(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    /// Entries in segment order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.winners.iter().map(|(index, camera)| (*index, *camera))
    }
}

impl FromIterator<(usize, u32)> for WinnerMap {
    fn from_iter<I: IntoIterator<Item = (usize, u32)>>(iter: I) -> Self {
        Self {
            winners: iter.into_iter().collect(),
        }
    }
}

/// Resolve a camera id against the number of available cameras.
///
/// Ids outside `[1, camera_count]` resolve to camera 1.
pub fn clamp_camera_id(camera_id: u32, camera_count: usize) -> u32 {
    if camera_id == 0 || camera_id as usize > camera_count {
        DEFAULT_CAMERA
    } else {
        camera_id
    }
}
