//! CLI layer: argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod error;
pub mod output;

pub use args::{Cli, Commands};
pub use error::{CliError, CliResult};

use clap::error::ErrorKind;

/// Message for a verb clap does not know.
pub const UNSUPPORTED_COMMAND: &str = "Unsupported command!\nPlease use flownote --help";

/// Exit code for an argv clap rejected or answered itself (help, version).
pub fn parse_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => crate::exitcode::OK,
        _ => crate::exitcode::USAGE,
    }
}
