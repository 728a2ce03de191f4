//! ToyMovie CLI: onion-skin previews and playback for stop-motion frames.
//!
//! Usage:
//!   toymovie preview --frames <DIR> --live <IMAGE> --output <PNG>
//!   toymovie play --frames <DIR>       Play a sequence in real time
//!   toymovie info --frames <DIR>       Show sequence information
//!   toymovie config                    Print the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use toymovie_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "toymovie",
    about = "Stop-motion capture with onion skinning",
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

#[derive(Subcommand)]
enum Commands {
    /// Composite the live image with the last frames of a sequence
    Preview {
        /// Directory of frame images, ordered by file name
        #[arg(short, long)]
        frames: PathBuf,

        /// Image standing in for the live camera view
        #[arg(short, long)]
        live: PathBuf,

        /// Number of ghost frames (defaults to the configured value)
        #[arg(long)]
        count: Option<u32>,

        /// Ghost opacity in [0, 1] (defaults to the configured value)
        #[arg(long)]
        opacity: Option<f32>,

        /// Preview width (defaults to the live image width)
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Preview height (defaults to the live image height)
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Capture the live image into the sequence before compositing
        #[arg(long)]
        capture: bool,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Play a sequence in real time
    Play {
        /// Directory of frame images, ordered by file name
        #[arg(short, long)]
        frames: PathBuf,

        /// Frames per second (defaults to the configured value)
        #[arg(long)]
        fps: Option<f64>,

        /// Number of times to loop through the sequence
        #[arg(long, default_value = "1")]
        loops: u32,
    },

    /// Show sequence information
    Info {
        /// Directory of frame images, ordered by file name
        #[arg(short, long)]
        frames: PathBuf,

        /// Print frame metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    toymovie_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Preview {
            frames,
            live,
            count,
            opacity,
            width,
            height,
            capture,
            output,
        } => commands::preview::run(
            &config,
            commands::preview::PreviewArgs {
                frames,
                live,
                count,
                opacity,
                size: width.zip(height),
                capture,
                output,
            },
        ),
        Commands::Play { frames, fps, loops } => {
            commands::play::run(&config, frames, fps, loops).await
        }
        Commands::Info { frames, json } => commands::info::run(&config, frames, json),
        Commands::Config => commands::config::run(&config),
    }
}
