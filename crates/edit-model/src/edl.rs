//! Edit-decision list entries.

use serde::{Deserialize, Serialize};

/// Alternating motion profile applied to a clip's crop region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomState {
    /// Slow linear creep from 1.0x.
    Wide,
    /// Fast punch-in followed by a slow creep.
    Tight,
}

impl ZoomState {
    /// Zoom profile for the clip at `index` in the edit: even clips are wide.
    pub fn for_clip_index(index: usize) -> Self {
        if index % 2 == 0 {
            Self::Wide
        } else {
            Self::Tight
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wide => "wide",
            Self::Tight => "tight",
        }
    }
}

/// One resolved shot of the edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditClip {
    /// 0-based index into the session's camera list.
    pub source_index: usize,
    /// Start time in the source (seconds).
    pub start: f64,
    /// End time in the source (seconds). Always greater than `start`.
    pub end: f64,
    /// Motion profile for this clip.
    pub zoom: ZoomState,
}

impl EditClip {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// 1-based camera id of the source.
    pub fn camera_id(&self) -> u32 {
        self.source_index as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_state_alternates_by_index() {
        let states: Vec<ZoomState> = (0..5).map(ZoomState::for_clip_index).collect();
        assert_eq!(
            states,
            vec![
                ZoomState::Wide,
                ZoomState::Tight,
                ZoomState::Wide,
                ZoomState::Tight,
                ZoomState::Wide
            ]
        );
    }

    #[test]
    fn test_zoom_state_serializes_lowercase() {
        let json = serde_json::to_string(&ZoomState::Tight).unwrap();
        assert_eq!(json, "\"tight\"");
    }

    #[test]
    fn test_camera_id_is_one_based() {
        let clip = EditClip {
            source_index: 1,
            start: 0.0,
            end: 4.0,
            zoom: ZoomState::Wide,
        };
        assert_eq!(clip.camera_id(), 2);
        assert!((clip.duration() - 4.0).abs() < 1e-12);
    }
}
