//! Assembly orchestration: segment, score, plan, compile, render.
//!
//! Stages run one after another. Per-segment faults degrade inside their
//! stage; only missing inputs, planning errors and render failures end a run.

use std::path::PathBuf;
use std::sync::Arc;

use mishran_ai_director::{
    FfmpegFrameExtractor, FrameExtractor, HttpScoringOracle, OracleConfig, ScorerConfig,
    ScoringOracle, SegmentDecision, SegmentScorer,
};
use mishran_audio_analysis::{AudioAnalysis, AudioAnalyzer, CutAnalyzer};
use mishran_common::config::{AppConfig, RenderDefaults};
use mishran_common::error::{MishranError, MishranResult};
use mishran_edit_model::decision::WinnerMap;
use mishran_edit_model::edl::EditClip;
use mishran_edit_model::segment::Segment;
use mishran_edit_model::session::SessionSources;
use mishran_processing_core::build_edit_plan;
use mishran_processing_core::segmenter::SegmenterConfig;
use mishran_render_engine::{
    render_edit, CompileConfig, FfmpegBackend, FilterGraphCompiler, ProgressCallback,
    RenderBackend, RenderJob, ZoomCurve,
};
use serde::Serialize;

use crate::session::{RecordingsDirProvider, SessionProvider};

/// Everything decided for one run, short of rendering.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyPlan {
    pub session: SessionSources,
    pub segments: Vec<Segment>,
    /// Why segmentation fell back to fixed shots, if it did.
    pub segmentation_degraded: Option<String>,
    pub winners: WinnerMap,
    pub decisions: Vec<SegmentDecision>,
    pub clips: Vec<EditClip>,
    pub zoom: Vec<ZoomCurve>,
    /// Serialized `-filter_complex` graph.
    pub graph: String,
    /// Full ffmpeg argument list.
    pub args: Vec<String>,
    pub output: PathBuf,
    #[serde(skip)]
    job: RenderJob,
}

impl AssemblyPlan {
    pub fn render_job(&self) -> &RenderJob {
        &self.job
    }
}

/// The assembly pipeline with its collaborators injected.
pub struct Pipeline {
    sessions: Box<dyn SessionProvider>,
    analyzer: Arc<dyn CutAnalyzer>,
    scorer: SegmentScorer,
    compiler: FilterGraphCompiler,
    backend: Box<dyn RenderBackend>,
    render: RenderDefaults,
}

impl Pipeline {
    pub fn new(
        sessions: Box<dyn SessionProvider>,
        analyzer: Arc<dyn CutAnalyzer>,
        scorer: SegmentScorer,
        backend: Box<dyn RenderBackend>,
        render: RenderDefaults,
    ) -> Self {
        Self {
            sessions,
            analyzer,
            scorer,
            compiler: FilterGraphCompiler::new(CompileConfig::from(&render)),
            backend,
            render,
        }
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(config: &AppConfig) -> MishranResult<Self> {
        let oracle = HttpScoringOracle::new(OracleConfig::from_app_config(config))
            .map_err(|e| MishranError::config(format!("cannot build oracle client: {e}")))?;
        let extractor = FfmpegFrameExtractor::new(
            config.director.max_frame_dimension,
            config.director.jpeg_quality,
        );

        let analyzer = AudioAnalyzer::new(
            SegmenterConfig::from(&config.segmentation),
            config.segmentation.analysis_sample_rate,
        )?;

        Ok(Self::new(
            Box::new(RecordingsDirProvider::new(&config.recordings_dir)),
            Arc::new(analyzer),
            SegmentScorer::new(
                Arc::new(extractor) as Arc<dyn FrameExtractor>,
                Arc::new(oracle) as Arc<dyn ScoringOracle>,
                ScorerConfig::from(&config.director),
            ),
            Box::new(FfmpegBackend::new()),
            config.render.clone(),
        ))
    }

    /// Run every stage except the render.
    pub async fn plan(&self) -> MishranResult<AssemblyPlan> {
        let session = self.sessions.latest_session()?;
        if session.cameras.is_empty() {
            return Err(MishranError::missing_input("no camera sources"));
        }
        if let Some(path) = session.first_missing_file() {
            return Err(MishranError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let analysis = self.analyze(session.reference_audio.clone()).await;
        let segmentation_degraded = analysis.segments.reason().map(str::to_string);
        let duration_secs = analysis.duration_secs;
        let segments = analysis.segments.into_value();
        tracing::info!(
            segments = segments.len(),
            degraded = segmentation_degraded.is_some(),
            "Segmentation complete"
        );

        let report = self
            .scorer
            .score(&segments, &session.cameras, &session.session_id)
            .await;

        let clips = build_edit_plan(&segments, &report.winners, session.camera_count())?;
        let compiled = self
            .compiler
            .compile(&clips, session.camera_count(), duration_secs)?;

        let job = RenderJob::new(
            session.cameras.clone(),
            session.reference_audio.clone(),
            self.render.output.clone(),
            &compiled,
            &self.render,
        );

        Ok(AssemblyPlan {
            segments,
            segmentation_degraded,
            winners: report.winners,
            decisions: report.decisions,
            clips,
            zoom: compiled.curves,
            graph: job.filter_complex.clone(),
            args: job.ffmpeg_args(),
            output: job.output_path.clone(),
            session,
            job,
        })
    }

    /// Plan and render. Returns the plan and the rendered file.
    pub async fn run(
        &mut self,
        progress: Option<ProgressCallback>,
    ) -> MishranResult<(AssemblyPlan, PathBuf)> {
        let plan = self.plan().await?;
        let output = render_edit(plan.render_job(), self.backend.as_mut(), progress)?;
        tracing::info!(output = %output.display(), clips = plan.clips.len(), "Assembly complete");
        Ok((plan, output))
    }

    async fn analyze(&self, audio: PathBuf) -> AudioAnalysis {
        let analyzer = Arc::clone(&self.analyzer);
        match tokio::task::spawn_blocking(move || analyzer.analyze(&audio)).await {
            Ok(analysis) => analysis,
            Err(e) => self.analyzer.fallback(format!("analysis task failed: {e}")),
        }
    }
}
