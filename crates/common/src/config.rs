//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the scoring oracle endpoint.
pub const DIRECTOR_URL_ENV: &str = "AI_DIRECTOR_URL";

/// Environment variable that overrides the scoring oracle timeout (seconds).
pub const DIRECTOR_TIMEOUT_ENV: &str = "AI_DIRECTOR_TIMEOUT";

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding `recording_<ts>_<client>.mkv` files.
    pub recordings_dir: PathBuf,

    /// Shot segmentation parameters.
    pub segmentation: SegmentationDefaults,

    /// Scoring oracle and frame extraction parameters.
    pub director: DirectorDefaults,

    /// Output encoding parameters.
    pub render: RenderDefaults,

    /// Color-grade refinement parameters.
    pub refine: RefineDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Where cut candidates are placed relative to detected pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutStrategy {
    /// Cut where a speech interval ends.
    PauseEnd,
    /// Cut at the center of the silence between two speech intervals.
    PauseCenter,
}

impl std::str::FromStr for CutStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pause-end" | "end" => Ok(Self::PauseEnd),
            "pause-center" | "center" | "midpoint" => Ok(Self::PauseCenter),
            other => Err(format!(
                "Unknown cut strategy: {other}. Use: pause-end, pause-center"
            )),
        }
    }
}

/// Default segmentation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationDefaults {
    /// Shortest allowed shot (seconds).
    pub min_duration_secs: f64,

    /// Longest allowed shot (seconds). Enables the bounded-window policy.
    pub max_shot_duration_secs: Option<f64>,

    /// Frames quieter than the loudest frame by more than this are silence.
    pub top_db: f64,

    /// Analysis window length in samples.
    pub frame_length: usize,

    /// Hop between analysis windows in samples.
    pub hop_length: usize,

    /// Cut candidate placement.
    pub cut_strategy: CutStrategy,

    /// Sample rate the reference audio is decoded at for analysis.
    pub analysis_sample_rate: u32,

    /// Number of equal-length shots used when analysis fails.
    pub fallback_segment_count: usize,

    /// Length of each fallback shot (seconds).
    pub fallback_segment_secs: f64,
}

/// Default scoring oracle parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorDefaults {
    /// Oracle endpoint receiving the multipart submission.
    pub endpoint: String,

    /// Per-call timeout (seconds). Expiry counts as an oracle failure.
    pub timeout_secs: u64,

    /// Working directory for extracted stills. Cleared on every run.
    pub frames_dir: PathBuf,

    /// Longest side of an extracted still (pixels).
    pub max_frame_dimension: u32,

    /// JPEG quality scale passed to the extractor (2-31, lower is better).
    pub jpeg_quality: u32,
}

/// Default render parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Constant output frame rate.
    pub fps: u32,

    /// Output width.
    pub width: u32,

    /// Output height.
    pub height: u32,

    /// Frames spent on the fast punch-in of a tight shot.
    pub ramp_frames: u32,

    /// x264 preset.
    pub preset: String,

    /// Primary edited output file.
    pub output: PathBuf,
}

/// Default refinement (color grade) parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineDefaults {
    /// Graded output file.
    pub output: PathBuf,

    /// x264 constant rate factor.
    pub crf: u32,

    /// x264 preset.
    pub preset: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "mishran=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from("recordings"),
            segmentation: SegmentationDefaults::default(),
            director: DirectorDefaults::default(),
            render: RenderDefaults::default(),
            refine: RefineDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SegmentationDefaults {
    fn default() -> Self {
        Self {
            min_duration_secs: 3.0,
            max_shot_duration_secs: None,
            top_db: 18.0,
            frame_length: 2048,
            hop_length: 512,
            cut_strategy: CutStrategy::PauseCenter,
            analysis_sample_rate: 22050,
            fallback_segment_count: 3,
            fallback_segment_secs: 5.0,
        }
    }
}

impl Default for DirectorDefaults {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5678/webhook/ai-director-input".to_string(),
            timeout_secs: 60,
            frames_dir: PathBuf::from("cut_frames"),
            max_frame_dimension: 1024,
            jpeg_quality: 5,
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            width: 1280,
            height: 720,
            ramp_frames: 15,
            preset: "fast".to_string(),
            output: PathBuf::from("final_output.mp4"),
        }
    }
}

impl Default for RefineDefaults {
    fn default() -> Self {
        Self {
            output: PathBuf::from("refined_output.mp4"),
            crf: 18,
            preset: "slow".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults,
    /// then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_from(&config_file_path());
        config.apply_env_overrides();
        config
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Apply `AI_DIRECTOR_URL` / `AI_DIRECTOR_TIMEOUT` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(DIRECTOR_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.director.endpoint = url.to_string();
            }
        }
        if let Ok(raw) = std::env::var(DIRECTOR_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.director.timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "Ignoring invalid {DIRECTOR_TIMEOUT_ENV}"),
            }
        }
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("mishran").join("config.json")
}
