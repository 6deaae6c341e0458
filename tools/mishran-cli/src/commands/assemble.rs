//! Assemble the latest session into one edited video.

use mishran_common::config::AppConfig;
use mishran_pipeline::{AssemblyPlan, Pipeline};
use mishran_render_engine::export::RenderProgress;

pub async fn run(config: AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let mut pipeline = Pipeline::from_config(&config)?;

    if dry_run {
        let plan = pipeline.plan().await?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Assembling session from: {}", config.recordings_dir.display());
    println!("  Oracle: {}", config.director.endpoint);
    println!("  Output: {}", config.render.output.display());

    let progress_cb: Box<dyn Fn(RenderProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
    });

    match pipeline.run(Some(progress_cb)).await {
        Ok((plan, output)) => {
            println!();
            print_summary(&plan);
            println!("Edit complete: {}", output.display());
            Ok(())
        }
        Err(e) if e.is_setup_failure() => {
            Err(anyhow::anyhow!("Cannot start assembly: {e}"))
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Assembly failed: {e}"))
        }
    }
}

fn print_summary(plan: &AssemblyPlan) {
    println!("Session {}", plan.session.session_id);
    if let Some(reason) = &plan.segmentation_degraded {
        println!("  [WARN] Audio analysis failed ({reason}); used fixed shots");
    }
    let defaulted = plan
        .decisions
        .iter()
        .filter(|d| d.winner.is_degraded())
        .count();
    println!(
        "  Shots: {} ({} defaulted to camera 1)",
        plan.clips.len(),
        defaulted
    );
    for clip in &plan.clips {
        println!(
            "    {:>8.2}s - {:>8.2}s  cam {}  {}",
            clip.start,
            clip.end,
            clip.camera_id(),
            clip.zoom.as_str()
        );
    }
}
