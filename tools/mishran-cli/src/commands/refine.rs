//! Apply the cinematic grade to a rendered edit.

use std::path::PathBuf;

use mishran_common::config::AppConfig;
use mishran_render_engine::refine::{refine, RefineJob};

pub fn run(input: Option<PathBuf>, output: Option<PathBuf>, config: &AppConfig) -> anyhow::Result<()> {
    let input = input.unwrap_or_else(|| config.render.output.clone());
    let mut job = RefineJob::new(input, &config.refine);
    if let Some(path) = output {
        job = job.with_output(path);
    }

    println!("Refining: {}", job.input.display());
    println!("  Output: {}", job.output.display());

    let output = refine(&job).map_err(|e| anyhow::anyhow!("Refinement failed: {e}"))?;
    println!("Refinement complete: {}", output.display());
    Ok(())
}
