// tabmerge CLI - merge a tree of contribution spreadsheets into one dataset

mod exit_codes;
mod logging;
mod merge;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tabmerge_config::settings::MAX_ROWS_PER_PART;
use tabmerge_config::{ConfigError, LogFormat};
use tabmerge_io::{DiscoverError, OutputError};

use exit_codes::{
    config_exit_code, discover_exit_code, output_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "tabmerge")]
#[command(about = "Merge a directory tree of CSV/XLSX files sharing a 16-column schema")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log output format (overrides the settings file)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    /// Debug-level logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine every matching file under INPUT and write the XLSX artifacts
    #[command(after_help = "\
Artifacts (written to OUTPUT, default ./tabmerge-output):
  all_combined_data.xlsx           combined rows (split into _1, _2, ... when large)
  mismatched_files_report.xlsx     files whose columns did not match
  failed_files.xlsx                files that could not be read

Examples:
  tabmerge merge /data/contributions -o /data/combined
  tabmerge merge /data/contributions --rows-per-part 100000 --json
  TABMERGE_INPUT_DIR=/data/in tabmerge merge")]
    Merge {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory
        #[arg(long, short = 'o', env = "TABMERGE_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Rows per combined file before splitting into parts
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_ROWS_PER_PART as u64))]
        rows_per_part: Option<u64>,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Only log errors
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Classify every file without writing anything (dry run)
    #[command(after_help = "\
Examples:
  tabmerge check /data/contributions
  tabmerge check /data/contributions --json | jq '.files[] | select(.status != \"combined\")'")]
    Check {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory to leave out of discovery
        #[arg(long, short = 'o', env = "TABMERGE_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Print outcomes as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

/// Arguments shared by every command that scans an input tree.
#[derive(Args)]
pub struct SourceArgs {
    /// Input directory to scan recursively
    #[arg(env = "TABMERGE_INPUT_DIR")]
    pub input: Option<PathBuf>,

    /// Settings file (default: <config dir>/tabmerge/settings.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// CSV field delimiter (single ASCII character, \t for tab)
    #[arg(long, value_parser = parse_delimiter_arg)]
    pub delimiter: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

fn parse_delimiter_arg(s: &str) -> Result<String, String> {
    tabmerge_config::settings::parse_delimiter(s)
        .map(|_| s.to_string())
        .map_err(|e| e.to_string())
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("TABMERGE_COMMIT_HASH"), ")",
        "\nengine:  tabmerge-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TABMERGE_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logs = merge::LogArgs {
        format: cli.log_format.map(LogFormat::from),
        verbose: cli.verbose,
        quiet: false,
    };

    let result = match cli.command {
        Commands::Merge { source, output, rows_per_part, json, quiet } => {
            merge::cmd_merge(source, output, rows_per_part, json, merge::LogArgs { quiet, ..logs })
        }
        Commands::Check { source, output, json } => merge::cmd_check(source, output, json, logs),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::NotFound(_) => Some("pass an existing file to --config, or omit it".to_string()),
            ConfigError::Parse { .. } => Some(
                "known keys: input_dir, output_dir, rows_per_part, csv_delimiter, [log] level, format"
                    .to_string(),
            ),
            _ => None,
        };
        Self { code: config_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<DiscoverError> for CliError {
    fn from(err: DiscoverError) -> Self {
        Self { code: discover_exit_code(&err), message: err.to_string(), hint: None }
    }
}

impl From<OutputError> for CliError {
    fn from(err: OutputError) -> Self {
        let hint = match &err {
            OutputError::Write { .. } => Some("is the file open in another program?".to_string()),
            OutputError::CreateDir { .. } => None,
        };
        Self { code: output_exit_code(&err), message: err.to_string(), hint }
    }
}
