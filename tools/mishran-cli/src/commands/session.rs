//! Show the latest recording session.

use mishran_common::config::AppConfig;
use mishran_pipeline::{RecordingsDirProvider, SessionProvider};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let session = RecordingsDirProvider::new(&config.recordings_dir)
        .latest_session()
        .map_err(|e| anyhow::anyhow!("Failed to find a session: {e}"))?;

    println!("Session: {}", session.session_id);
    println!("  Audio: {}", session.reference_audio.display());
    println!("  Cameras: {}", session.camera_count());
    for (i, camera) in session.cameras.iter().enumerate() {
        println!("    cam {}: {}", i + 1, camera.display());
    }
    Ok(())
}
