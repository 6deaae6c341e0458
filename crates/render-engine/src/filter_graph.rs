//! Typed filter-graph description and its ffmpeg serialization.

use std::fmt;

/// A single filter with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Video trim to `[start, end]` seconds of the source.
    Trim { start: f64, end: f64 },
    /// Reset video timestamps to start at zero.
    SetPts,
    /// Resample to a constant frame rate.
    Fps(u32),
    /// Centered crop of `iw/z` by `ih/z`, with `z` an expression in `n`.
    CenterCrop { zoom: String },
    Scale { width: u32, height: u32 },
    Format(String),
    /// Square sample aspect ratio.
    SetSar,
    Concat { segments: usize, video: usize, audio: usize },
    /// Audio trim to `[start, end]` seconds.
    ATrim { start: f64, end: f64 },
    /// Reset audio timestamps to start at zero.
    ASetPts,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Trim { start, end } => write!(f, "trim=start={start}:end={end}"),
            Filter::SetPts => f.write_str("setpts=PTS-STARTPTS"),
            Filter::Fps(fps) => write!(f, "fps={fps}"),
            Filter::CenterCrop { zoom } => write!(
                f,
                "crop='iw/{zoom}':'ih/{zoom}':'(iw-ow)/2':'(ih-oh)/2'"
            ),
            Filter::Scale { width, height } => write!(f, "scale={width}:{height}"),
            Filter::Format(pix_fmt) => write!(f, "format={pix_fmt}"),
            Filter::SetSar => f.write_str("setsar=1"),
            Filter::Concat {
                segments,
                video,
                audio,
            } => write!(f, "concat=n={segments}:v={video}:a={audio}"),
            Filter::ATrim { start, end } => write!(f, "atrim=start={start}:end={end}"),
            Filter::ASetPts => f.write_str("asetpts=PTS-STARTPTS"),
        }
    }
}

/// A labelled stream reference such as `0:v` or `v3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamLabel(pub String);

impl StreamLabel {
    pub fn input_video(index: usize) -> Self {
        Self(format!("{index}:v"))
    }

    pub fn input_audio(index: usize) -> Self {
        Self(format!("{index}:a"))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for StreamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// Filters applied in sequence from input labels to output labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    pub inputs: Vec<StreamLabel>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<StreamLabel>,
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "{input}")?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        for output in &self.outputs {
            write!(f, "{output}")?;
        }
        Ok(())
    }
}

/// The complete graph for one edit.
///
/// Exactly one video stream and one audio stream leave the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraphSpec {
    /// One chain per clip, in edit order.
    pub clip_chains: Vec<FilterChain>,
    /// Joins every clip output into the final video stream.
    pub concat: FilterChain,
    /// Trims the reference audio to the edit length.
    pub audio: FilterChain,
    pub video_output: StreamLabel,
    pub audio_output: StreamLabel,
}

impl FilterGraphSpec {
    pub fn chains(&self) -> impl Iterator<Item = &FilterChain> {
        self.clip_chains
            .iter()
            .chain(std::iter::once(&self.concat))
            .chain(std::iter::once(&self.audio))
    }

    /// Serialize for `-filter_complex`.
    pub fn to_filter_complex(&self) -> String {
        self.chains()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FilterGraphSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_filter_complex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_serialization() {
        let chain = FilterChain {
            inputs: vec![StreamLabel::input_video(1)],
            filters: vec![
                Filter::Trim {
                    start: 6.0,
                    end: 13.0,
                },
                Filter::SetPts,
                Filter::Fps(30),
            ],
            outputs: vec![StreamLabel::named("v1")],
        };
        assert_eq!(
            chain.to_string(),
            "[1:v]trim=start=6:end=13,setpts=PTS-STARTPTS,fps=30[v1]"
        );
    }

    #[test]
    fn test_trim_times_keep_full_precision() {
        let start = 1.0 / 3.0;
        let end = 6.019_500_000_1;
        let text = Filter::ATrim { start, end }.to_string();
        assert_eq!(text, format!("atrim=start={start}:end={end}"));

        let (lo, hi) = text
            .trim_start_matches("atrim=start=")
            .split_once(":end=")
            .unwrap();
        assert_eq!(lo.parse::<f64>().unwrap(), start);
        assert_eq!(hi.parse::<f64>().unwrap(), end);
    }

    #[test]
    fn test_center_crop() {
        let crop = Filter::CenterCrop {
            zoom: "(1.0+0.04*n/120)".into(),
        };
        assert_eq!(
            crop.to_string(),
            "crop='iw/(1.0+0.04*n/120)':'ih/(1.0+0.04*n/120)':'(iw-ow)/2':'(ih-oh)/2'"
        );
    }
}
