use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidrelay")]
#[command(author, version, about = "Fetch remote videos and post them into chat")]
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
    /// Deliver a video as a reply to a Discord message
    Send {
        /// Source URL
        #[arg(required = true)]
        url: String,

        /// Channel of the triggering message
        #[arg(long)]
        channel: String,

        /// Id of the triggering message
        #[arg(long)]
        message: String,

        /// Reply with an error embed on rejection or failure
        #[arg(long)]
        notify: bool,
    },

    /// Run the pipeline and write the result into a local directory
    Fetch {
        /// Source URL
        #[arg(required = true)]
        url: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Print a notice on rejection or failure
        #[arg(long)]
        notify: bool,
    },

    /// Show the compression plan for a clip of the given length
    Plan {
        /// Clip duration in seconds
        #[arg(long)]
        duration: f64,

        /// Upload ceiling in megabytes (defaults to the configured limit)
        #[arg(long)]
        max_upload_mb: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a local media file
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

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
