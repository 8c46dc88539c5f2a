use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediafx")]
#[command(author, version, about = "Declarative media editing on top of ffmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a batch of work items from a JSON file
    Run {
        /// JSON array of work items
        #[arg(required = true)]
        batch: PathBuf,

        /// Record failing items and keep going instead of aborting
        #[arg(long)]
        continue_on_fail: bool,

        /// Directory receiving binary results (default: current directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Probe a media file and display duration, audio and geometry
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Show the detected engine version and transition support
    Capabilities {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage fonts available to text overlays
    Fonts {
        #[command(subcommand)]
        command: FontCommands,
    },

    /// Remove stale files from the temp directory
    Sweep {
        /// Remove files older than this many hours (default from config)
        #[arg(long)]
        max_age_hours: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum FontCommands {
    /// List system and user fonts
    List {
        /// all, system, user, korean or global
        #[arg(long, default_value = "all")]
        filter: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a user font
    Upload {
        /// Font file (.ttf, .otf, ...)
        #[arg(required = true)]
        file: PathBuf,

        /// Key used to select the font
        #[arg(long)]
        key: String,

        /// Display name (default: the key)
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a user font
    Delete {
        key: String,
    },

    /// Check whether a key is usable for a new font
    Validate {
        key: String,
    },

    /// Show one font
    Info {
        key: String,
    },
}
