//! Compiles an edit-decision list into a filter graph.
//!
//! Per clip: trim, retime, resample, zoom-crop, then normalize size, pixel
//! format and aspect so heterogeneous cameras concatenate cleanly. The
//! reference audio is trimmed to the end of the last clip.

use mishran_common::config::RenderDefaults;
use mishran_common::error::{MishranError, MishranResult};
use mishran_edit_model::edl::EditClip;

use crate::filter_graph::{Filter, FilterChain, FilterGraphSpec, StreamLabel};
use crate::zoom::{total_frames, ZoomCurve};

/// Output settings the compiler bakes into the graph.
#[derive(Debug, Clone)]
pub struct CompileConfig {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// Punch-in length of tight clips, in frames.
    pub ramp_frames: u32,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self::from(&RenderDefaults::default())
    }
}

impl From<&RenderDefaults> for CompileConfig {
    fn from(defaults: &RenderDefaults) -> Self {
        Self {
            fps: defaults.fps,
            width: defaults.width,
            height: defaults.height,
            ramp_frames: defaults.ramp_frames,
        }
    }
}

/// A compiled edit: the graph plus the per-clip motion it encodes.
#[derive(Debug, Clone)]
pub struct CompiledEdit {
    pub graph: FilterGraphSpec,
    pub curves: Vec<ZoomCurve>,
    /// Length of the edit in seconds.
    pub duration_secs: f64,
}

impl CompiledEdit {
    pub fn total_frames(&self) -> u64 {
        self.curves.iter().map(|c| c.total_frames).sum()
    }
}

pub struct FilterGraphCompiler {
    config: CompileConfig,
}

impl FilterGraphCompiler {
    pub fn new(config: CompileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Compile `clips` against camera inputs `0..n` and the audio at `audio_input_index`.
    ///
    /// With `audio_duration_secs`, the audio trim never runs past the source.
    pub fn compile(
        &self,
        clips: &[EditClip],
        audio_input_index: usize,
        audio_duration_secs: Option<f64>,
    ) -> MishranResult<CompiledEdit> {
        let last = clips
            .last()
            .ok_or_else(|| MishranError::planning("cannot compile an empty edit"))?;
        if self.config.fps == 0 || self.config.width == 0 || self.config.height == 0 {
            return Err(MishranError::config(
                "render fps and output size must be positive",
            ));
        }

        let mut clip_chains = Vec::with_capacity(clips.len());
        let mut curves = Vec::with_capacity(clips.len());
        for (i, clip) in clips.iter().enumerate() {
            if !clip.start.is_finite() || !clip.end.is_finite() || !(clip.start < clip.end) {
                return Err(MishranError::planning(format!(
                    "clip {i} has non-positive duration ({} -> {})",
                    clip.start, clip.end
                )));
            }
            if clip.source_index >= audio_input_index {
                return Err(MishranError::planning(format!(
                    "clip {i} refers to input {} but only {audio_input_index} cameras exist",
                    clip.source_index
                )));
            }

            let curve = ZoomCurve::new(
                clip.zoom,
                total_frames(clip.duration(), self.config.fps),
                self.config.ramp_frames,
            );
            clip_chains.push(self.clip_chain(i, clip, &curve));
            curves.push(curve);
        }

        let video_output = StreamLabel::named("v");
        let audio_output = StreamLabel::named("a");

        let concat = FilterChain {
            inputs: (0..clips.len())
                .map(|i| StreamLabel::named(format!("v{i}")))
                .collect(),
            filters: vec![Filter::Concat {
                segments: clips.len(),
                video: 1,
                audio: 0,
            }],
            outputs: vec![video_output.clone()],
        };

        let mut audio_end = last.end;
        if let Some(source) = audio_duration_secs.filter(|d| d.is_finite() && *d > 0.0) {
            if source < audio_end {
                tracing::warn!(
                    edit_end_secs = audio_end,
                    audio_secs = source,
                    "Edit runs past the reference audio, trimming audio to its length"
                );
                audio_end = source;
            }
        }
        let audio = FilterChain {
            inputs: vec![StreamLabel::input_audio(audio_input_index)],
            filters: vec![
                Filter::ATrim {
                    start: 0.0,
                    end: audio_end,
                },
                Filter::ASetPts,
            ],
            outputs: vec![audio_output.clone()],
        };

        let compiled = CompiledEdit {
            graph: FilterGraphSpec {
                clip_chains,
                concat,
                audio,
                video_output,
                audio_output,
            },
            curves,
            duration_secs: last.end,
        };
        tracing::debug!(
            clips = clips.len(),
            total_frames = compiled.total_frames(),
            duration_secs = compiled.duration_secs,
            "Compiled filter graph"
        );
        Ok(compiled)
    }

    fn clip_chain(&self, index: usize, clip: &EditClip, curve: &ZoomCurve) -> FilterChain {
        FilterChain {
            inputs: vec![StreamLabel::input_video(clip.source_index)],
            filters: vec![
                Filter::Trim {
                    start: clip.start,
                    end: clip.end,
                },
                Filter::SetPts,
                Filter::Fps(self.config.fps),
                Filter::CenterCrop {
                    zoom: curve.expression(),
                },
                Filter::Scale {
                    width: self.config.width,
                    height: self.config.height,
                },
                Filter::Format("yuv420p".to_string()),
                Filter::SetSar,
            ],
            outputs: vec![StreamLabel::named(format!("v{index}"))],
        }
    }
}
