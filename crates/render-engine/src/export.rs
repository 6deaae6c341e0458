//! Render jobs and the ffmpeg backend.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use mishran_common::config::RenderDefaults;
use mishran_common::error::{MishranError, MishranResult};
use serde::Serialize;

use crate::compiler::CompiledEdit;

/// A compiled edit ready to be rendered.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Camera sources, in the input order the graph refers to.
    pub cameras: Vec<PathBuf>,

    /// Reference audio, the input after the last camera.
    pub audio: PathBuf,

    /// Output file path.
    pub output_path: PathBuf,

    /// Serialized `-filter_complex` graph.
    pub filter_complex: String,

    pub fps: u32,

    /// x264 preset.
    pub preset: String,

    /// Frames the graph produces, for progress reporting.
    pub total_frames: u64,

    /// Length of the edit in seconds.
    pub expected_duration_secs: f64,
}

impl RenderJob {
    pub fn new(
        cameras: Vec<PathBuf>,
        audio: PathBuf,
        output_path: PathBuf,
        edit: &CompiledEdit,
        settings: &RenderDefaults,
    ) -> Self {
        Self {
            cameras,
            audio,
            output_path,
            filter_complex: edit.graph.to_filter_complex(),
            fps: settings.fps,
            preset: settings.preset.clone(),
            total_frames: edit.total_frames(),
            expected_duration_secs: edit.duration_secs,
        }
    }

    /// Full ffmpeg argument list for this job.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string()];
        for input in self.cameras.iter().chain(std::iter::once(&self.audio)) {
            args.push("-i".to_string());
            args.push(input.display().to_string());
        }
        args.extend([
            "-filter_complex".to_string(),
            self.filter_complex.clone(),
            "-map".to_string(),
            "[v]".to_string(),
            "-map".to_string(),
            "[a]".to_string(),
            "-r".to_string(),
            self.fps.to_string(),
        ]);
        args.extend(codec_args(&self.preset));
        args.extend([
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-nostats".to_string(),
            self.output_path.display().to_string(),
        ]);
        args
    }
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send>;

/// Render progress report.
#[derive(Debug, Clone, Serialize)]
pub struct RenderProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: RenderStage,
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
}

/// Trait for render backends.
pub trait RenderBackend: Send {
    /// Execute the render job.
    fn render(&mut self, job: &RenderJob, progress: Option<ProgressCallback>) -> MishranResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Render the edit to a video file.
///
/// Fails before starting the backend if any input is missing.
pub fn render_edit(
    job: &RenderJob,
    backend: &mut dyn RenderBackend,
    progress: Option<ProgressCallback>,
) -> MishranResult<PathBuf> {
    tracing::info!(
        output = %job.output_path.display(),
        cameras = job.cameras.len(),
        total_frames = job.total_frames,
        "Starting render"
    );

    for input in job.cameras.iter().chain(std::iter::once(&job.audio)) {
        if !input.exists() {
            return Err(MishranError::FileNotFound {
                path: input.clone(),
            });
        }
    }

    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if let Some(cb) = &progress {
        cb(RenderProgress {
            progress: 0.0,
            frames_rendered: 0,
            total_frames: job.total_frames,
            eta_secs: 0.0,
            stage: RenderStage::Preparing,
        });
    }

    if !backend.is_available() {
        return Err(MishranError::unsupported(format!(
            "Render backend '{}' is not available (expected ffmpeg in PATH)",
            backend.name()
        )));
    }

    tracing::info!(backend = backend.name(), "Using render backend");
    backend.render(job, progress)?;

    Ok(job.output_path.clone())
}

/// Renders through an ffmpeg child process, parsing `-progress` output.
#[derive(Debug, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    fn run_ffmpeg(&self, job: &RenderJob, progress: Option<ProgressCallback>) -> MishranResult<()> {
        let args = job.ffmpeg_args();
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut cmd = Command::new("ffmpeg");
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| MishranError::render(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            args_len = args.len(),
            total_frames = job.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MishranError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MishranError::render("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        let mut latest_progress = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = std::time::Instant::now();
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| MishranError::render(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            latest_progress.update(key, value);
            if key != "progress" {
                continue;
            }

            if latest_progress.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = latest_progress.out_time_secs;
                last_progress_wall = std::time::Instant::now();
            }
            if let Some(cb) = &progress {
                cb(progress_report(
                    &latest_progress,
                    job.total_frames,
                    job.expected_duration_secs,
                    start.elapsed().as_secs_f64(),
                ));
            }
            if last_progress_wall.elapsed().as_secs() >= 10 {
                tracing::warn!(
                    out_time_secs = latest_progress.out_time_secs,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for 10s"
                );
                last_progress_wall = std::time::Instant::now();
            }
        }

        let status = child
            .wait()
            .map_err(|e| MishranError::render(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(MishranError::render(format!(
                "ffmpeg render failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 1.0,
                frames_rendered: job.total_frames,
                total_frames: job.total_frames,
                eta_secs: 0.0,
                stage: RenderStage::Complete,
            });
        }

        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            output = %job.output_path.display(),
            "Render finished"
        );
        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(&mut self, job: &RenderJob, progress: Option<ProgressCallback>) -> MishranResult<()> {
        self.run_ffmpeg(job, progress)
    }

    fn is_available(&self) -> bool {
        ffmpeg_available()
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

fn codec_args(preset: &str) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        preset.to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
    ]
}

/// Whether `ffmpeg` is on `PATH`.
pub fn ffmpeg_available() -> bool {
    command_exists("ffmpeg")
}

fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    frame: Option<u64>,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports out_time_ms in microseconds as well.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "frame" => {
                self.frame = value.parse::<u64>().ok();
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> RenderProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = state
        .frame
        .unwrap_or_else(|| (progress * total_frames as f64).round() as u64)
        .min(total_frames);
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    RenderProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            RenderStage::Finalizing
        } else {
            RenderStage::Rendering
        },
    }
}
