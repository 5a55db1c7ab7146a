use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::session::DetectOptions;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone, Copy, Default)]
pub struct DetectArgs {
    /// Frame rate to use instead of probing the video
    #[arg(long)]
    pub fps: Option<f64>,

    /// Take frame numbers from the gaze feed instead of the frames/ folder
    #[arg(long, default_value_t = false)]
    pub from_feed_keys: bool,
}

impl From<DetectArgs> for DetectOptions {
    fn from(a: DetectArgs) -> Self {
        DetectOptions { fps: a.fps, from_feed_keys: a.from_feed_keys }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect mutual gaze in a session and write <name>_gaze_events.json
    Detect {
        /// Session directory
        session: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
    },

    /// Align gaze events with a transcript
    Align {
        /// Session directory (uses its default file names)
        #[arg(required_unless_present_all = ["events", "transcript", "output"])]
        session: Option<PathBuf>,
        /// Gaze events JSON
        #[arg(long)]
        events: Option<PathBuf>,
        /// SRT transcript
        #[arg(long)]
        transcript: Option<PathBuf>,
        /// Aligned transcript JSON to write
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Detect, then align when a transcript is present
    Run {
        session: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
    },

    /// Run every session directory under a dataset root
    Batch {
        root: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
        /// Re-run sessions that already have gaze events
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Write the default configuration
    InitConfig {
        /// Destination (defaults to ./mutual_gaze.json)
        path: Option<PathBuf>,
    },
}
