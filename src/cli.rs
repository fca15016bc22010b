use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ismforge")]
#[command(author, version, about = "Smooth Streaming manifest generator for MP4 assets")]
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
    /// Generate .ism and .ismc manifests for a container directory
    Generate {
        /// Directory holding the asset files (overrides storage.container)
        container: Option<PathBuf>,

        /// Manifest base name (default: derived from the first file)
        #[arg(short, long)]
        name: Option<String>,

        /// Directory to write manifests to (default: the container)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace existing manifests
        #[arg(long)]
        overwrite: bool,

        /// Parse files one at a time
        #[arg(long, conflicts_with = "threads")]
        single_threaded: bool,

        /// Number of worker threads
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Print the tracks extracted from a single media file
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
