//! Cinematic refinement of a finished edit.
//!
//! Independent of the edit itself: only the rendered file path crosses in.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use mishran_common::config::RefineDefaults;
use mishran_common::error::{MishranError, MishranResult};

/// Static grade applied in order: denoise, 2.39:1 crop, color, tone curve,
/// vignette, letterbox to 720 lines, sharpen.
pub const REFINE_FILTERS: &[&str] = &[
    "hqdn3d=1.5:1.5:6:6",
    "crop=iw:iw/2.39",
    "eq=saturation=1.1:brightness=0.05",
    "curves=master='0/0 0.25/0.2 0.75/0.8 1/1'",
    "vignette",
    "pad=iw:720:0:(oh-ih)/2",
    "unsharp=5:5:0.2",
];

pub fn refine_filter_chain() -> String {
    REFINE_FILTERS.join(",")
}

#[derive(Debug, Clone)]
pub struct RefineJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub crf: u32,
    pub preset: String,
}

impl RefineJob {
    pub fn new(input: impl Into<PathBuf>, settings: &RefineDefaults) -> Self {
        Self {
            input: input.into(),
            output: settings.output.clone(),
            crf: settings.crf,
            preset: settings.preset.clone(),
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            self.input.display().to_string(),
            "-vf".to_string(),
            refine_filter_chain(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-c:a".to_string(),
            "copy".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            self.output.display().to_string(),
        ]
    }
}

/// Apply the grade. Blocks until ffmpeg exits.
pub fn refine(job: &RefineJob) -> MishranResult<PathBuf> {
    ensure_input(&job.input)?;
    tracing::info!(
        input = %job.input.display(),
        output = %job.output.display(),
        crf = job.crf,
        "Applying cinematic grade"
    );

    let started = std::time::Instant::now();
    let output = Command::new("ffmpeg")
        .args(job.ffmpeg_args())
        .stdin(Stdio::null())
        .output()
        .map_err(|e| MishranError::render(format!("Failed to start ffmpeg: {e}")))?;

    if !output.status.success() {
        return Err(MishranError::render(format!(
            "ffmpeg refine failed (status {}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    tracing::info!(
        elapsed_secs = started.elapsed().as_secs_f64(),
        output = %job.output.display(),
        "Refinement finished"
    );
    Ok(job.output.clone())
}

fn ensure_input(path: &Path) -> MishranResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(MishranError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_chain_order() {
        let chain = refine_filter_chain();
        assert!(chain.starts_with("hqdn3d=1.5:1.5:6:6,crop=iw:iw/2.39,"));
        assert!(chain.ends_with("vignette,pad=iw:720:0:(oh-ih)/2,unsharp=5:5:0.2"));
    }

    #[test]
    fn test_args_use_settings() {
        let job = RefineJob::new("final_output.mp4", &RefineDefaults::default());
        let joined = job.ffmpeg_args().join(" ");
        assert!(joined.contains("-c:v libx264 -crf 18 -preset slow -c:a copy"));
        assert!(joined.ends_with("refined_output.mp4"));
    }

    #[test]
    fn test_missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let job = RefineJob::new(dir.path().join("nope.mp4"), &RefineDefaults::default());
        assert!(matches!(
            refine(&job),
            Err(MishranError::FileNotFound { .. })
        ));
    }
}
