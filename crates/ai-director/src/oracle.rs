//! Scoring oracle interface and its HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use mishran_common::config::{AppConfig, DirectorDefaults};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;

use crate::error::{DirectorError, DirectorResult};

/// One candidate still submitted to the oracle.
#[derive(Debug, Clone)]
pub struct CandidateFrame {
    /// 1-based camera id.
    pub camera_id: u32,
    pub file_name: String,
    /// JPEG bytes, already read into memory.
    pub bytes: Vec<u8>,
}

/// Metadata sent with each scoring request.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    /// 0-based segment index.
    pub segment_index: usize,
    pub session_id: String,
}

/// External service that picks the best camera among candidate frames.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Return the winning 1-based camera id.
    async fn score(&self, frames: &[CandidateFrame], request: &ScoreRequest) -> DirectorResult<u32>;
}

/// Configuration for the HTTP oracle.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self::from(&DirectorDefaults::default())
    }
}

impl From<&DirectorDefaults> for OracleConfig {
    fn from(defaults: &DirectorDefaults) -> Self {
        Self {
            endpoint: defaults.endpoint.clone(),
            timeout: Duration::from_secs(defaults.timeout_secs),
        }
    }
}

impl OracleConfig {
    /// Config from an already env-resolved application config.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::from(&config.director)
    }
}

/// Oracle reached over HTTP with a multipart POST.
pub struct HttpScoringOracle {
    http: Client,
    config: OracleConfig,
}

impl HttpScoringOracle {
    pub fn new(config: OracleConfig) -> DirectorResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DirectorError::Network)?;

        Ok(Self { http, config })
    }

    fn build_form(frames: &[CandidateFrame], request: &ScoreRequest) -> DirectorResult<Form> {
        let mut form = Form::new()
            .text("timestamp_index", request.segment_index.to_string())
            .text("session_id", request.session_id.clone());

        for frame in frames {
            let part = Part::bytes(frame.bytes.clone())
                .file_name(frame.file_name.clone())
                .mime_str("image/jpeg")?;
            form = form.part(format!("image_{}", frame.camera_id), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl ScoringOracle for HttpScoringOracle {
    async fn score(&self, frames: &[CandidateFrame], request: &ScoreRequest) -> DirectorResult<u32> {
        let form = Self::build_form(frames, request)?;
        tracing::debug!(
            endpoint = %self.config.endpoint,
            segment = request.segment_index,
            frames = frames.len(),
            "Sending frames to scoring oracle"
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DirectorError::Timeout(self.config.timeout.as_secs())
                } else {
                    DirectorError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectorError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| DirectorError::InvalidResponse(format!("not JSON ({e}): {body}")))?;

        let winner = value
            .get("winner_id")
            .ok_or_else(|| DirectorError::InvalidResponse(format!("missing winner_id: {body}")))?;

        parse_winner_id(winner)
            .ok_or_else(|| DirectorError::InvalidResponse(format!("unusable winner_id: {winner}")))
    }
}

/// Interpret a `winner_id` value: an integer (possibly written as `2.0`), or a
/// string whose digits form one.
///
/// `"image_2"` and `"\"3\""` are accepted. Zero, empty, fractional and
/// non-numeric values are not.
pub fn parse_winner_id(value: &Value) -> Option<u32> {
    let id = match value {
        Value::Number(n) => match n.as_u64() {
            Some(n) => u32::try_from(n).ok()?,
            None => integral_id(n.as_f64()?)?,
        },
        Value::String(s) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse::<u32>().ok()?
        }
        _ => return None,
    };
    (id > 0).then_some(id)
}

fn integral_id(n: f64) -> Option<u32> {
    let integral = n.is_finite() && n.fract() == 0.0;
    (integral && (0.0..=f64::from(u32::MAX)).contains(&n)).then_some(n as u32)
}
