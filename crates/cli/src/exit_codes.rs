//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code | Description                                            |
//! |------|--------------------------------------------------------|
//! | 0    | Success (mismatched or failed files are not errors)    |
//! | 1    | General error (unspecified)                            |
//! | 2    | Usage error (bad arguments, no input directory given)  |
//! | 3    | Input error (missing input directory, invalid config)  |
//! | 4    | Output error (an artifact could not be written)        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant `From` impl in main.rs

/// Success - the run completed. Per-file problems are reported, not fatal.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// Also what clap exits with on its own parse errors.
pub const EXIT_USAGE: u8 = 2;

/// Input directory missing or not a directory, or settings file unreadable,
/// malformed or out of range. Nothing was processed.
pub const EXIT_INPUT: u8 = 3;

/// Writing an output artifact failed. Artifacts written before the failure
/// remain on disk and the summary has already been printed.
pub const EXIT_OUTPUT: u8 = 4;

use tabmerge_config::ConfigError;
use tabmerge_io::{DiscoverError, OutputError};

/// Map a settings error to its exit code.
pub fn config_exit_code(_err: &ConfigError) -> u8 {
    EXIT_INPUT
}

/// Map a discovery error to its exit code.
pub fn discover_exit_code(err: &DiscoverError) -> u8 {
    match err {
        DiscoverError::MissingInput(_) | DiscoverError::NotADirectory(_) => EXIT_INPUT,
    }
}

/// Map an output error to its exit code.
pub fn output_exit_code(err: &OutputError) -> u8 {
    match err {
        OutputError::CreateDir { .. } | OutputError::Write { .. } => EXIT_OUTPUT,
    }
}
