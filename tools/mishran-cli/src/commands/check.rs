//! Check system capabilities and configuration.

use mishran_common::config::{config_file_path, AppConfig};
use mishran_render_engine::export::ffmpeg_available;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Mishran System Check");
    println!("{}", "=".repeat(50));

    let ffmpeg = ffmpeg_available();
    if ffmpeg {
        println!("[OK] ffmpeg found in PATH");
    } else {
        println!("[FAIL] ffmpeg not found in PATH");
    }

    if config.recordings_dir.is_dir() {
        println!("[OK] Recordings: {}", config.recordings_dir.display());
    } else {
        println!(
            "[WARN] Recordings directory missing: {}",
            config.recordings_dir.display()
        );
    }

    let path = config_file_path();
    println!();
    println!(
        "Config: {} ({})",
        path.display(),
        if path.exists() { "loaded" } else { "defaults" }
    );
    println!("  Oracle: {} (timeout {}s)", config.director.endpoint, config.director.timeout_secs);
    let seg = &config.segmentation;
    println!(
        "  Segmentation: min {}s, max {}, top_db {}, {:?}",
        seg.min_duration_secs,
        seg.max_shot_duration_secs
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "none".to_string()),
        seg.top_db,
        seg.cut_strategy
    );
    println!(
        "  Render: {}x{} @ {}fps, preset {}",
        config.render.width, config.render.height, config.render.fps, config.render.preset
    );

    println!();
    if ffmpeg {
        println!("All required capabilities are available. Mishran is ready.");
    } else {
        println!("ffmpeg is required for analysis, frame extraction and rendering.");
    }

    Ok(())
}
