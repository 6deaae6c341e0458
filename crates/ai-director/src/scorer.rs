//! Per-segment camera scoring.
//!
//! Each segment is scored in isolation: extract one still per camera at the
//! segment midpoint, submit the stills that exist, and record the winner.
//! Every failure resolves to camera 1 for that segment alone.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mishran_common::config::DirectorDefaults;
use mishran_edit_model::decision::{WinnerMap, DEFAULT_CAMERA};
use mishran_edit_model::outcome::Outcome;
use mishran_edit_model::segment::Segment;
use serde::Serialize;

use crate::error::DirectorError;
use crate::frames::{frame_file_name, FrameExtractor};
use crate::oracle::{CandidateFrame, ScoreRequest, ScoringOracle};

/// Scorer settings.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Working directory for extracted stills. Cleared at the start of each run.
    pub frames_dir: PathBuf,

    /// Upper bound on a single oracle call.
    pub oracle_timeout: Duration,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self::from(&DirectorDefaults::default())
    }
}

impl From<&DirectorDefaults> for ScorerConfig {
    fn from(defaults: &DirectorDefaults) -> Self {
        Self {
            frames_dir: defaults.frames_dir.clone(),
            oracle_timeout: Duration::from_secs(defaults.timeout_secs),
        }
    }
}

/// How one segment's camera was chosen.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentDecision {
    pub segment_index: usize,
    pub midpoint_secs: f64,
    /// Cameras that produced a still for this segment.
    pub cameras_offered: Vec<u32>,
    /// The oracle's pick, or camera 1 with the failure reason.
    pub winner: Outcome<u32>,
}

/// Result of a scoring run.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub winners: WinnerMap,
    pub decisions: Vec<SegmentDecision>,
}

impl ScoreReport {
    pub fn degraded_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.winner.is_degraded())
            .count()
    }
}

/// Scores every segment against the available cameras.
pub struct SegmentScorer {
    extractor: Arc<dyn FrameExtractor>,
    oracle: Arc<dyn ScoringOracle>,
    config: ScorerConfig,
}

impl SegmentScorer {
    pub fn new(
        extractor: Arc<dyn FrameExtractor>,
        oracle: Arc<dyn ScoringOracle>,
        config: ScorerConfig,
    ) -> Self {
        Self {
            extractor,
            oracle,
            config,
        }
    }

    /// Score all segments in order. Never fails.
    pub async fn score(
        &self,
        segments: &[Segment],
        cameras: &[PathBuf],
        session_id: &str,
    ) -> ScoreReport {
        if let Err(e) = reset_frames_dir(&self.config.frames_dir).await {
            tracing::warn!(
                error = %e,
                dir = %self.config.frames_dir.display(),
                "Could not reset frames directory"
            );
        }

        tracing::info!(
            segments = segments.len(),
            cameras = cameras.len(),
            session_id,
            "Scoring segments"
        );

        let mut winners = WinnerMap::new();
        let mut decisions = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            let decision = self.score_segment(index, segment, cameras, session_id).await;
            winners.insert(index, *decision.winner.value());
            decisions.push(decision);
        }

        let report = ScoreReport { winners, decisions };
        tracing::info!(
            segments = segments.len(),
            defaulted = report.degraded_count(),
            "Scoring finished"
        );
        report
    }

    async fn score_segment(
        &self,
        index: usize,
        segment: &Segment,
        cameras: &[PathBuf],
        session_id: &str,
    ) -> SegmentDecision {
        let midpoint = segment.midpoint();
        let frames = self.collect_frames(index, midpoint, cameras).await;
        let cameras_offered: Vec<u32> = frames.iter().map(|f| f.camera_id).collect();

        let winner = if frames.is_empty() {
            Outcome::degraded(DEFAULT_CAMERA, "no frames extracted")
        } else {
            let request = ScoreRequest {
                segment_index: index,
                session_id: session_id.to_string(),
            };
            match self.ask_oracle(&frames, &request).await {
                Ok(camera_id) => Outcome::complete(camera_id),
                Err(e) => Outcome::degraded(DEFAULT_CAMERA, e.to_string()),
            }
        };

        match winner.reason() {
            None => tracing::info!(
                segment = index,
                midpoint_secs = midpoint,
                camera = *winner.value(),
                "Oracle picked camera"
            ),
            Some(reason) => tracing::warn!(
                segment = index,
                midpoint_secs = midpoint,
                reason,
                "Scoring failed, defaulting to camera 1"
            ),
        }

        SegmentDecision {
            segment_index: index,
            midpoint_secs: midpoint,
            cameras_offered,
            winner,
        }
    }

    async fn collect_frames(
        &self,
        index: usize,
        midpoint: f64,
        cameras: &[PathBuf],
    ) -> Vec<CandidateFrame> {
        let mut frames = vec![];
        for (i, source) in cameras.iter().enumerate() {
            let camera_id = i as u32 + 1;
            let file_name = frame_file_name(index, camera_id);
            let output = self.config.frames_dir.join(&file_name);

            let extracted = self
                .extractor
                .extract_frame(source, midpoint, &output)
                .await;
            let bytes = match extracted {
                Ok(()) => tokio::fs::read(&output).await.map_err(DirectorError::from),
                Err(e) => Err(e),
            };

            match bytes {
                Ok(bytes) if !bytes.is_empty() => frames.push(CandidateFrame {
                    camera_id,
                    file_name,
                    bytes,
                }),
                Ok(_) => tracing::debug!(segment = index, camera = camera_id, "Empty frame"),
                Err(e) => tracing::debug!(
                    segment = index,
                    camera = camera_id,
                    error = %e,
                    "Excluding camera from segment"
                ),
            }
        }
        frames
    }

    async fn ask_oracle(
        &self,
        frames: &[CandidateFrame],
        request: &ScoreRequest,
    ) -> Result<u32, DirectorError> {
        let call = self.oracle.score(frames, request);
        match tokio::time::timeout(self.config.oracle_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DirectorError::Timeout(self.config.oracle_timeout.as_secs())),
        }
    }
}

async fn reset_frames_dir(dir: &Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(dir).await? {
        tokio::fs::remove_dir_all(dir).await?;
    }
    tokio::fs::create_dir_all(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use crate::error::DirectorResult;

    /// Writes a fake JPEG unless the camera's source is listed as broken.
    struct StubExtractor {
        broken: HashSet<PathBuf>,
    }

    #[async_trait]
    impl FrameExtractor for StubExtractor {
        async fn extract_frame(
            &self,
            source: &Path,
            _at_secs: f64,
            output: &Path,
        ) -> DirectorResult<()> {
            if self.broken.contains(source) {
                return Err(DirectorError::Extraction("decode error".into()));
            }
            tokio::fs::write(output, b"\xff\xd8jpeg").await?;
            Ok(())
        }
    }

    /// Returns a fixed winner, failing for listed segments; records what it saw.
    struct ScriptedOracle {
        winner: u32,
        fail_on: HashSet<usize>,
        seen: Mutex<Vec<(usize, Vec<u32>)>>,
    }

    #[async_trait]
    impl ScoringOracle for ScriptedOracle {
        async fn score(
            &self,
            frames: &[CandidateFrame],
            request: &ScoreRequest,
        ) -> DirectorResult<u32> {
            self.seen.lock().unwrap().push((
                request.segment_index,
                frames.iter().map(|f| f.camera_id).collect(),
            ));
            if self.fail_on.contains(&request.segment_index) {
                return Err(DirectorError::InvalidResponse("connection reset".into()));
            }
            Ok(self.winner)
        }
    }

    struct SlowOracle;

    #[async_trait]
    impl ScoringOracle for SlowOracle {
        async fn score(&self, _: &[CandidateFrame], _: &ScoreRequest) -> DirectorResult<u32> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(2)
        }
    }

    fn segments() -> Vec<Segment> {
        vec![
            Segment::new(0.0, 6.0),
            Segment::new(6.0, 13.0),
            Segment::new(13.0, 20.0),
        ]
    }

    fn cameras() -> Vec<PathBuf> {
        vec![PathBuf::from("cam1.mkv"), PathBuf::from("cam2.mkv")]
    }

    fn scorer(
        dir: &Path,
        broken: &[&str],
        oracle: Arc<dyn ScoringOracle>,
        timeout: Duration,
    ) -> SegmentScorer {
        let extractor = StubExtractor {
            broken: broken.iter().map(PathBuf::from).collect(),
        };
        SegmentScorer::new(
            Arc::new(extractor),
            oracle,
            ScorerConfig {
                frames_dir: dir.join("cut_frames"),
                oracle_timeout: timeout,
            },
        )
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_one_segment() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Arc::new(ScriptedOracle {
            winner: 2,
            fail_on: [1].into_iter().collect(),
            seen: Mutex::new(vec![]),
        });
        let scorer = scorer(dir.path(), &[], oracle.clone(), Duration::from_secs(5));

        let report = scorer.score(&segments(), &cameras(), "1700000000000").await;

        assert_eq!(report.winners.get(0), Some(2));
        assert_eq!(report.winners.get(1), Some(1));
        assert_eq!(report.winners.get(2), Some(2));
        assert_eq!(report.degraded_count(), 1);
        assert_eq!(oracle.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_extraction_excludes_camera() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Arc::new(ScriptedOracle {
            winner: 2,
            fail_on: HashSet::new(),
            seen: Mutex::new(vec![]),
        });
        let scorer = scorer(dir.path(), &["cam1.mkv"], oracle.clone(), Duration::from_secs(5));

        let report = scorer.score(&segments()[..1], &cameras(), "s").await;

        assert_eq!(report.decisions[0].cameras_offered, vec![2]);
        assert_eq!(oracle.seen.lock().unwrap()[0], (0, vec![2]));
        assert!(dir.path().join("cut_frames/seg0_cam2.jpg").exists());
    }

    #[tokio::test]
    async fn test_no_frames_skips_oracle() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Arc::new(ScriptedOracle {
            winner: 2,
            fail_on: HashSet::new(),
            seen: Mutex::new(vec![]),
        });
        let scorer = scorer(
            dir.path(),
            &["cam1.mkv", "cam2.mkv"],
            oracle.clone(),
            Duration::from_secs(5),
        );

        let report = scorer.score(&segments(), &cameras(), "s").await;

        assert!(oracle.seen.lock().unwrap().is_empty());
        assert!(report.decisions.iter().all(|d| d.winner.is_degraded()));
        assert!(report.winners.iter().all(|(_, camera)| camera == 1));
    }

    #[tokio::test]
    async fn test_oracle_timeout_defaults_to_camera_one() {
        let dir = tempfile::tempdir().unwrap();
        let scorer = scorer(dir.path(), &[], Arc::new(SlowOracle), Duration::from_millis(50));

        let report = scorer.score(&segments()[..1], &cameras(), "s").await;

        assert_eq!(report.winners.get(0), Some(1));
        assert!(report.decisions[0]
            .winner
            .reason()
            .is_some_and(|r| r.contains("Timeout")));
    }

    #[tokio::test]
    async fn test_frames_dir_is_cleared_each_run() {
        let dir = tempfile::tempdir().unwrap();
        let frames = dir.path().join("cut_frames");
        std::fs::create_dir_all(&frames).unwrap();
        std::fs::write(frames.join("stale.jpg"), b"old").unwrap();

        let oracle = Arc::new(ScriptedOracle {
            winner: 1,
            fail_on: HashSet::new(),
            seen: Mutex::new(vec![]),
        });
        let scorer = scorer(dir.path(), &[], oracle, Duration::from_secs(5));
        scorer.score(&segments()[..1], &cameras(), "s").await;

        assert!(!frames.join("stale.jpg").exists());
        assert!(frames.join("seg0_cam1.jpg").exists());
    }
}
