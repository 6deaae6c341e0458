//! End-to-end assembly with in-memory collaborators.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mishran_ai_director::{
    CandidateFrame, DirectorError, DirectorResult, FrameExtractor, ScoreRequest, ScorerConfig,
    ScoringOracle, SegmentScorer,
};
use mishran_audio_analysis::{AudioAnalysis, CutAnalyzer};
use mishran_common::config::{AppConfig, RenderDefaults};
use mishran_common::error::{MishranError, MishranResult};
use mishran_edit_model::edl::ZoomState;
use mishran_edit_model::outcome::Outcome;
use mishran_edit_model::segment::Segment;
use mishran_edit_model::session::SessionSources;
use mishran_pipeline::{FixedSession, Pipeline, RecordingsDirProvider};
use mishran_render_engine::{ProgressCallback, RenderBackend, RenderJob};

struct FixedCuts {
    segments: Vec<Segment>,
}

impl CutAnalyzer for FixedCuts {
    fn analyze(&self, _path: &Path) -> AudioAnalysis {
        AudioAnalysis {
            segments: Outcome::complete(self.segments.clone()),
            duration_secs: self.segments.last().map(|s| s.end),
        }
    }

    fn fallback(&self, reason: String) -> AudioAnalysis {
        AudioAnalysis {
            segments: Outcome::degraded(vec![Segment::new(0.0, 5.0)], reason),
            duration_secs: None,
        }
    }
}

struct BrokenAudio;

impl CutAnalyzer for BrokenAudio {
    fn analyze(&self, _path: &Path) -> AudioAnalysis {
        self.fallback("decoder crashed".to_string())
    }

    fn fallback(&self, reason: String) -> AudioAnalysis {
        AudioAnalysis {
            segments: Outcome::degraded(
                (0..3)
                    .map(|i| Segment::new(i as f64 * 5.0, (i + 1) as f64 * 5.0))
                    .collect(),
                reason,
            ),
            duration_secs: None,
        }
    }
}

struct StillWriter;

#[async_trait]
impl FrameExtractor for StillWriter {
    async fn extract_frame(&self, _source: &Path, _at: f64, output: &Path) -> DirectorResult<()> {
        tokio::fs::write(output, b"jpeg").await?;
        Ok(())
    }
}

/// Answers "image_<n>" like the production oracle, failing on listed segments.
struct NamedWinner {
    answer: String,
    fail_on: Vec<usize>,
}

#[async_trait]
impl ScoringOracle for NamedWinner {
    async fn score(&self, _frames: &[CandidateFrame], request: &ScoreRequest) -> DirectorResult<u32> {
        if self.fail_on.contains(&request.segment_index) {
            return Err(DirectorError::InvalidResponse("connection refused".into()));
        }
        mishran_ai_director::parse_winner_id(&serde_json::json!(self.answer))
            .ok_or_else(|| DirectorError::InvalidResponse(self.answer.clone()))
    }
}

#[derive(Default)]
struct CountingOracle {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ScoringOracle for CountingOracle {
    async fn score(&self, _frames: &[CandidateFrame], _request: &ScoreRequest) -> DirectorResult<u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }
}

#[derive(Default, Clone)]
struct CapturingBackend {
    jobs: Arc<Mutex<Vec<RenderJob>>>,
    fail: bool,
}

impl RenderBackend for CapturingBackend {
    fn render(&mut self, job: &RenderJob, _: Option<ProgressCallback>) -> MishranResult<()> {
        self.jobs.lock().unwrap().push(job.clone());
        if self.fail {
            return Err(MishranError::render("ffmpeg render failed (status 1): bad filter"));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "capturing"
    }
}

fn session_in(dir: &Path, cameras: usize) -> SessionSources {
    let cameras: Vec<PathBuf> = (1..=cameras)
        .map(|i| dir.join(format!("recording_1700000000000_cam{i}.mkv")))
        .collect();
    let audio = dir.join("recording_1700000000000_host_audio.mkv");
    for path in cameras.iter().chain(std::iter::once(&audio)) {
        std::fs::write(path, b"x").unwrap();
    }
    SessionSources {
        session_id: "1700000000000".into(),
        cameras,
        reference_audio: audio,
    }
}

fn pipeline(
    dir: &Path,
    session: SessionSources,
    analyzer: Arc<dyn CutAnalyzer>,
    oracle: NamedWinner,
    backend: CapturingBackend,
) -> Pipeline {
    let render = RenderDefaults {
        output: dir.join("out/final_output.mp4"),
        ..Default::default()
    };
    Pipeline::new(
        Box::new(FixedSession(session)),
        analyzer,
        SegmentScorer::new(
            Arc::new(StillWriter),
            Arc::new(oracle),
            ScorerConfig {
                frames_dir: dir.join("cut_frames"),
                oracle_timeout: Duration::from_secs(5),
            },
        ),
        Box::new(backend),
        render,
    )
}

fn pause_cuts() -> Arc<dyn CutAnalyzer> {
    Arc::new(FixedCuts {
        segments: vec![
            Segment::new(0.0, 6.0),
            Segment::new(6.0, 13.0),
            Segment::new(13.0, 20.0),
        ],
    })
}

#[tokio::test]
async fn test_every_clip_uses_the_named_camera() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_in(dir.path(), 2);
    let pipeline = pipeline(
        dir.path(),
        session,
        pause_cuts(),
        NamedWinner {
            answer: "image_2".into(),
            fail_on: vec![],
        },
        CapturingBackend::default(),
    );

    let plan = pipeline.plan().await.unwrap();

    assert_eq!(plan.clips.len(), 3);
    assert!(plan.clips.iter().all(|c| c.source_index == 1));
    let zooms: Vec<_> = plan.clips.iter().map(|c| c.zoom).collect();
    assert_eq!(zooms, vec![ZoomState::Wide, ZoomState::Tight, ZoomState::Wide]);
    assert!(plan.graph.contains("[1:v]trim=start=6:end=13"));
    assert!(plan.graph.ends_with("[2:a]atrim=start=0:end=20,asetpts=PTS-STARTPTS[a]"));
    assert!(plan.segmentation_degraded.is_none());
}

#[tokio::test]
async fn test_oracle_failure_on_one_segment_defaults_it() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_in(dir.path(), 2);
    let pipeline = pipeline(
        dir.path(),
        session,
        pause_cuts(),
        NamedWinner {
            answer: "2".into(),
            fail_on: vec![1],
        },
        CapturingBackend::default(),
    );

    let plan = pipeline.plan().await.unwrap();

    let sources: Vec<_> = plan.clips.iter().map(|c| c.source_index).collect();
    assert_eq!(sources, vec![1, 0, 1]);
    assert!(plan.decisions[1].winner.is_degraded());
}

#[tokio::test]
async fn test_out_of_range_winner_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_in(dir.path(), 2);
    let pipeline = pipeline(
        dir.path(),
        session,
        pause_cuts(),
        NamedWinner {
            answer: "image_7".into(),
            fail_on: vec![],
        },
        CapturingBackend::default(),
    );

    let plan = pipeline.plan().await.unwrap();
    assert!(plan.clips.iter().all(|c| c.source_index == 0));
}

#[tokio::test]
async fn test_broken_audio_falls_back_and_still_renders() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_in(dir.path(), 3);
    let backend = CapturingBackend::default();
    let mut pipeline = pipeline(
        dir.path(),
        session,
        Arc::new(BrokenAudio),
        NamedWinner {
            answer: "3".into(),
            fail_on: vec![],
        },
        backend.clone(),
    );

    let (plan, output) = pipeline.run(None).await.unwrap();

    assert_eq!(plan.segmentation_degraded.as_deref(), Some("decoder crashed"));
    assert_eq!(plan.clips.len(), 3);
    assert_eq!(output, dir.path().join("out/final_output.mp4"));

    let jobs = backend.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].cameras.len(), 3);
    assert_eq!(jobs[0].total_frames, 450);
}

#[tokio::test]
async fn test_render_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_in(dir.path(), 2);
    let mut pipeline = pipeline(
        dir.path(),
        session,
        pause_cuts(),
        NamedWinner {
            answer: "1".into(),
            fail_on: vec![],
        },
        CapturingBackend {
            fail: true,
            ..Default::default()
        },
    );

    let err = pipeline.run(None).await.unwrap_err();
    assert!(err.to_string().contains("bad filter"));
}

#[tokio::test]
async fn test_missing_session_aborts_before_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let render = RenderDefaults::default();
    let pipeline = Pipeline::new(
        Box::new(RecordingsDirProvider::new(dir.path())),
        Arc::new(BrokenAudio),
        SegmentScorer::new(
            Arc::new(StillWriter),
            Arc::new(NamedWinner {
                answer: "1".into(),
                fail_on: vec![],
            }),
            ScorerConfig {
                frames_dir: dir.path().join("cut_frames"),
                oracle_timeout: Duration::from_secs(1),
            },
        ),
        Box::new(CapturingBackend::default()),
        render,
    );

    let err = pipeline.plan().await.unwrap_err();
    assert!(err.is_setup_failure());
    assert!(!dir.path().join("cut_frames").exists());
}

#[tokio::test]
async fn test_missing_reference_audio_aborts_before_scoring() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(dir.path(), 1);
    let missing = dir.path().join("missing_host_audio.mkv");
    session.reference_audio = missing.clone();

    let calls = Arc::new(AtomicUsize::new(0));
    let backend = CapturingBackend::default();
    let mut pipeline = Pipeline::new(
        Box::new(FixedSession(session)),
        Arc::new(BrokenAudio),
        SegmentScorer::new(
            Arc::new(StillWriter),
            Arc::new(CountingOracle {
                calls: Arc::clone(&calls),
            }),
            ScorerConfig {
                frames_dir: dir.path().join("cut_frames"),
                oracle_timeout: Duration::from_secs(1),
            },
        ),
        Box::new(backend.clone()),
        RenderDefaults::default(),
    );

    let err = pipeline.run(None).await.unwrap_err();

    assert!(err.is_setup_failure());
    assert!(matches!(err, MishranError::FileNotFound { ref path } if *path == missing));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(backend.jobs.lock().unwrap().is_empty());
    assert!(!dir.path().join("cut_frames").exists());
}

#[tokio::test]
async fn test_missing_camera_file_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(dir.path(), 2);
    std::fs::remove_file(&session.cameras[1]).unwrap();
    let missing = session.cameras[1].clone();

    let pipeline = pipeline(
        dir.path(),
        session,
        pause_cuts(),
        NamedWinner {
            answer: "1".into(),
            fail_on: vec![],
        },
        CapturingBackend::default(),
    );

    let err = pipeline.plan().await.unwrap_err();
    assert!(matches!(err, MishranError::FileNotFound { ref path } if *path == missing));
}

#[test]
fn test_shot_bounds_below_minimum_reject_configuration() {
    let mut config = AppConfig::default();
    config.segmentation.min_duration_secs = 3.0;
    config.segmentation.max_shot_duration_secs = Some(2.0);

    let err = Pipeline::from_config(&config).err().unwrap();
    assert!(matches!(err, MishranError::Config { .. }));
}
