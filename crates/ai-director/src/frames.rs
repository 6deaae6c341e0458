//! Still-frame extraction.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{DirectorError, DirectorResult};

/// Extracts a single still image from a video source.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Write the frame at `at_secs` of `source` to `output` as JPEG.
    async fn extract_frame(&self, source: &Path, at_secs: f64, output: &Path) -> DirectorResult<()>;
}

/// Name of the still for `camera_id` in segment `segment_index`.
pub fn frame_file_name(segment_index: usize, camera_id: u32) -> String {
    format!("seg{segment_index}_cam{camera_id}.jpg")
}

/// Frame extraction through ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    /// Longest output side in pixels. Smaller frames are not upscaled.
    pub max_dimension: u32,

    /// ffmpeg `-q:v` value (2 best, 31 worst).
    pub jpeg_quality: u32,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self {
            max_dimension: 1024,
            jpeg_quality: 5,
        }
    }
}

impl FfmpegFrameExtractor {
    pub fn new(max_dimension: u32, jpeg_quality: u32) -> Self {
        Self {
            max_dimension,
            jpeg_quality,
        }
    }

    /// Scale filter bounding the longer side, preserving aspect ratio.
    pub fn scale_filter(&self) -> String {
        let max = self.max_dimension;
        format!("scale='if(gt(iw,ih),min({max},iw),-1)':'if(gt(iw,ih),-1,min({max},ih))'")
    }

    pub fn build_args(&self, source: &Path, at_secs: f64, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-ss".to_string(),
            format!("{at_secs:.3}"),
            "-i".to_string(),
            source.display().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            self.jpeg_quality.to_string(),
            "-vf".to_string(),
            self.scale_filter(),
            "-loglevel".to_string(),
            "error".to_string(),
            output.display().to_string(),
        ]
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(&self, source: &Path, at_secs: f64, output: &Path) -> DirectorResult<()> {
        let result = Command::new("ffmpeg")
            .args(self.build_args(source, at_secs, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !result.status.success() {
            return Err(DirectorError::Extraction(format!(
                "ffmpeg exited with {} for {}: {}",
                result.status,
                source.display(),
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }
        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(DirectorError::Extraction(format!(
                "no frame written for {} at {at_secs:.3}s",
                source.display()
            )));
        }
        Ok(())
    }
}
