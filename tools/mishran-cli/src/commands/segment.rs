//! Show where the cuts fall in an audio file.

use std::path::PathBuf;

use mishran_audio_analysis::{AudioAnalyzer, CutAnalyzer};
use mishran_common::config::AppConfig;
use mishran_processing_core::SegmenterConfig;

pub fn run(audio: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let analyzer = AudioAnalyzer::new(
        SegmenterConfig::from(&config.segmentation),
        config.segmentation.analysis_sample_rate,
    )?;
    let analysis = analyzer.analyze(&audio);

    println!("Audio: {}", audio.display());
    if let Some(duration) = analysis.duration_secs {
        println!("  Duration: {duration:.2}s");
    }
    println!("  Strategy: {:?}", config.segmentation.cut_strategy);
    if let Some(reason) = analysis.segments.reason() {
        println!("  [WARN] Analysis failed ({reason}); showing fallback shots");
    }

    let segments = analysis.segments.value();
    println!("  Shots: {}", segments.len());
    for (i, segment) in segments.iter().enumerate() {
        println!(
            "    #{i:<3} {:>8.2}s - {:>8.2}s  ({:.2}s)",
            segment.start,
            segment.end,
            segment.duration()
        );
    }
    Ok(())
}
