//! Edit-decision list construction.
//!
//! Resolves the winner map produced by scoring into concrete clips: one clip
//! per segment, in segment order, with the zoom profile fixed by clip position.
//! Adjacent segments with the same camera are never merged; the zoom cadence
//! follows the cuts, not camera changes.

use mishran_common::error::{MishranError, MishranResult};
use mishran_edit_model::decision::{clamp_camera_id, WinnerMap};
use mishran_edit_model::edl::{EditClip, ZoomState};
use mishran_edit_model::segment::Segment;

/// Build the edit-decision list.
///
/// Missing winners resolve to camera 1, as do ids outside `[1, camera_count]`.
pub fn build_edit_plan(
    segments: &[Segment],
    winners: &WinnerMap,
    camera_count: usize,
) -> MishranResult<Vec<EditClip>> {
    if camera_count == 0 {
        return Err(MishranError::planning("no camera sources to assign"));
    }

    let mut clips = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        if !(segment.start < segment.end) {
            return Err(MishranError::planning(format!(
                "segment {index} has non-positive duration ({} -> {})",
                segment.start, segment.end
            )));
        }

        let requested = winners.winner_for(index);
        let camera_id = clamp_camera_id(requested, camera_count);
        if camera_id != requested {
            tracing::warn!(
                segment = index,
                requested,
                camera_count,
                "Winner out of range, using camera 1"
            );
        }

        clips.push(EditClip {
            source_index: (camera_id - 1) as usize,
            start: segment.start,
            end: segment.end,
            zoom: ZoomState::for_clip_index(index),
        });
    }

    tracing::debug!(clips = clips.len(), camera_count, "Built edit plan");
    Ok(clips)
}
