use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediagate")]
#[command(author, version, about = "One view over many media backends")]
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
    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// List configured backend instances
    Instances {
        /// Only show instances owned by this user
        #[arg(long)]
        user: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}
