//! CLI argument definitions using clap
//!
//! Commands:
//! - aerofiles serve [--config <path>] [--port <port>]
//! - aerofiles check [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "./aerofiles.json";

/// aerofiles - a file manager API over an object-storage bucket
#[derive(Parser, Debug)]
#[command(name = "aerofiles")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file (default: ./aerofiles.json if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate configuration and print the effective settings
    Check {
        /// Path to configuration file (default: ./aerofiles.json if present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
