//! Decoded audio samples.

/// A mono waveform with its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Samples per second.
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Total duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Convert a sample position to seconds.
    pub fn samples_to_secs(&self, samples: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        samples as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
