//! Mishran CLI — Command-line interface for multicam conversation editing.
//!
//! Usage:
//!   mishran assemble [OPTIONS]   Cut the latest session into one edited video
//!   mishran segment <AUDIO>      Show where the cuts fall in an audio file
//!   mishran session              Show the latest recording session
//!   mishran refine [INPUT]       Apply the cinematic grade to a rendered edit
//!   mishran check                Check system capabilities and configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mishran_common::config::{AppConfig, CutStrategy, SegmentationDefaults};

mod commands;

#[derive(Parser)]
#[command(
    name = "mishran",
    about = "Automatic multicam editing for recorded conversations",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for shot segmentation.
#[derive(Args, Debug, Clone, Default)]
pub struct SegmentationArgs {
    /// Shortest allowed shot (seconds)
    #[arg(long)]
    pub min_duration: Option<f64>,

    /// Longest allowed shot (seconds); enables bounded-window cutting
    #[arg(long)]
    pub max_shot: Option<f64>,

    /// Where cuts land: pause-end or pause-center
    #[arg(long)]
    pub cut_strategy: Option<CutStrategy>,

    /// Silence threshold below peak (dB); lower values give more cuts
    #[arg(long)]
    pub top_db: Option<f64>,
}

impl SegmentationArgs {
    pub fn apply(&self, defaults: &mut SegmentationDefaults) {
        if let Some(min) = self.min_duration {
            defaults.min_duration_secs = min;
        }
        if self.max_shot.is_some() {
            defaults.max_shot_duration_secs = self.max_shot;
        }
        if let Some(strategy) = self.cut_strategy {
            defaults.cut_strategy = strategy;
        }
        if let Some(top_db) = self.top_db {
            defaults.top_db = top_db;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Cut the latest session into one edited video
    Assemble {
        /// Recordings directory
        #[arg(long)]
        recordings: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        segmentation: SegmentationArgs,

        /// Scoring oracle endpoint (overrides AI_DIRECTOR_URL)
        #[arg(long)]
        director_url: Option<String>,

        /// Oracle timeout in seconds (overrides AI_DIRECTOR_TIMEOUT)
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the plan as JSON instead of rendering
        #[arg(long)]
        dry_run: bool,
    },

    /// Show where the cuts fall in an audio file
    Segment {
        /// Audio (or audio-bearing video) file
        audio: PathBuf,

        #[command(flatten)]
        segmentation: SegmentationArgs,
    },

    /// Show the latest recording session
    Session {
        /// Recordings directory
        #[arg(long)]
        recordings: Option<PathBuf>,
    },

    /// Apply the cinematic grade to a rendered edit
    Refine {
        /// Rendered edit (defaults to the configured render output)
        input: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check system capabilities and configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    mishran_common::logging::init_logging(&config.logging);
    tracing::debug!(config = ?config, "Effective configuration");

    match cli.command {
        Commands::Assemble {
            recordings,
            output,
            segmentation,
            director_url,
            timeout,
            dry_run,
        } => {
            if let Some(dir) = recordings {
                config.recordings_dir = dir;
            }
            if let Some(path) = output {
                config.render.output = path;
            }
            segmentation.apply(&mut config.segmentation);
            if let Some(url) = director_url {
                config.director.endpoint = url;
            }
            if let Some(secs) = timeout {
                config.director.timeout_secs = secs;
            }
            commands::assemble::run(config, dry_run).await
        }
        Commands::Segment {
            audio,
            segmentation,
        } => {
            segmentation.apply(&mut config.segmentation);
            commands::segment::run(audio, &config)
        }
        Commands::Session { recordings } => {
            if let Some(dir) = recordings {
                config.recordings_dir = dir;
            }
            commands::session::run(&config)
        }
        Commands::Refine { input, output } => commands::refine::run(input, output, &config),
        Commands::Check => commands::check::run(&config),
    }
}
