//! Reference-audio decoding through ffmpeg.

use std::path::Path;
use std::process::{Command, Stdio};

use mishran_common::error::{MishranError, MishranResult};
use mishran_edit_model::audio::Waveform;

const BYTES_PER_SAMPLE: usize = 4;

/// Arguments that decode `path` to mono little-endian f32 PCM on stdout.
pub fn decode_args(path: &Path, sample_rate: u32) -> Vec<String> {
    vec![
        "-i".to_string(),
        path.display().to_string(),
        "-vn".to_string(),
        "-ac".to_string(),
        "1".to_string(),
        "-ar".to_string(),
        sample_rate.to_string(),
        "-f".to_string(),
        "f32le".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "pipe:1".to_string(),
    ]
}

/// Decode an audio (or audio-bearing video) file into a mono waveform.
pub fn load_waveform(path: &Path, sample_rate: u32) -> MishranResult<Waveform> {
    if !path.exists() {
        return Err(MishranError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if sample_rate == 0 {
        return Err(MishranError::segmentation("analysis sample rate is zero"));
    }

    let started = std::time::Instant::now();
    let output = Command::new("ffmpeg")
        .args(decode_args(path, sample_rate))
        .stdin(Stdio::null())
        .output()
        .map_err(|e| MishranError::segmentation(format!("Failed to start ffmpeg: {e}")))?;

    if !output.status.success() {
        return Err(MishranError::segmentation(format!(
            "ffmpeg could not decode {} (status {}): {}",
            path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let samples = pcm_f32le_to_samples(&output.stdout);
    if samples.is_empty() {
        return Err(MishranError::segmentation(format!(
            "no audio samples decoded from {}",
            path.display()
        )));
    }

    let waveform = Waveform::new(samples, sample_rate);
    tracing::info!(
        path = %path.display(),
        samples = waveform.samples.len(),
        duration_secs = waveform.duration_secs(),
        decode_ms = started.elapsed().as_millis(),
        "Decoded reference audio"
    );
    Ok(waveform)
}

/// Convert raw f32le bytes to samples. A trailing partial sample is dropped.
pub fn pcm_f32le_to_samples(bytes: &[u8]) -> Vec<f32> {
    let chunks = bytes.chunks_exact(BYTES_PER_SAMPLE);
    if !chunks.remainder().is_empty() {
        tracing::warn!(
            trailing_bytes = chunks.remainder().len(),
            "Dropping incomplete trailing PCM sample"
        );
    }
    chunks
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
