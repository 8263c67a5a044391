//! CLI module for aerofiles
//!
//! Provides command-line interface for:
//! - serve: Boot storage and serve the HTTP API
//! - check: Validate and print the effective configuration

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, DEFAULT_CONFIG_PATH};
pub use commands::{build_signer, build_state, check, load_config, open_store, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
