//! ytplus CLI - Headless Player Driver
//!
//! Features:
//! - Simulated playback sessions against an in-process widget
//! - Embed parameter inspection
//! - State and error code reference

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

mod commands;
mod output;

/// ytplus CLI - YouTube player facade toolkit
#[derive(Parser)]
#[command(name = "ytplus")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Drive and inspect the ytplus player facade", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session against the simulated widget and print its events
    Simulate {
        /// Video to load
        video_id: String,

        /// Play the video as soon as the widget is ready
        #[arg(long)]
        autoplay: bool,

        /// Start offset in seconds
        #[arg(long, default_value = "0")]
        start: f64,

        /// Milliseconds before the player API becomes available
        #[arg(long, default_value = "100")]
        api_after: u64,

        /// Milliseconds between widget creation and ready
        #[arg(long, default_value = "200")]
        ready_after: u64,

        /// Time update period in milliseconds (overrides the options file)
        #[arg(long)]
        tick: Option<u64>,

        /// Session length in milliseconds
        #[arg(short, long, default_value = "3000")]
        duration: u64,

        /// Length of the simulated video in seconds
        #[arg(long)]
        video_length: Option<f64>,

        /// JSON file with player options
        #[arg(short, long)]
        options: Option<PathBuf>,

        /// Commands issued before the widget is ready, e.g. "play; seek 30; volume 40"
        #[arg(short, long, default_value = "")]
        script: String,
    },

    /// Print the embed parameters the widget would be created with
    Embed {
        /// Video to embed
        video_id: String,

        /// JSON file with player options
        #[arg(short, long)]
        options: Option<PathBuf>,

        /// Origin of the embedding page
        #[arg(long, default_value = "http://localhost")]
        origin: String,
    },

    /// List widget state codes and the events they produce
    States,

    /// List widget error codes and how they are handled
    Errors,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    ytplus_core::init();

    match cli.command {
        Commands::Simulate {
            video_id,
            autoplay,
            start,
            api_after,
            ready_after,
            tick,
            duration,
            video_length,
            options,
            script,
        } => {
            let mut options = commands::load_options(options.as_deref())?;
            if let Some(tick) = tick {
                options.time_update_frequency = tick;
            }
            let sim = commands::Simulation {
                video_id,
                autoplay,
                start: start.max(0.0),
                api_after: Duration::from_millis(api_after),
                ready_after: Duration::from_millis(ready_after),
                duration: Duration::from_millis(duration),
                video_length,
                options,
                script: commands::parse_script(&script)?,
            };
            commands::simulate(sim, &cli.format).await?;
        }
        Commands::Embed {
            video_id,
            options,
            origin,
        } => {
            commands::embed(&video_id, options.as_deref(), &origin, &cli.format)?;
        }
        Commands::States => commands::states(&cli.format)?,
        Commands::Errors => commands::errors(&cli.format)?,
    }

    Ok(())
}
