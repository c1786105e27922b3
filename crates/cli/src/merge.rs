//! `merge` and `check` commands.
//!
//! Both resolve settings (CLI > env > settings file > default), discover the
//! input files and aggregate them. `merge` then writes the artifacts; `check`
//! only reports what would happen.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tabmerge_config::{LogFormat, Settings};
use tabmerge_engine::{
    AggregateOutput, Aggregator, FailureRecord, FileOutcome, FileStatus, MismatchRecord,
    RunSummary, SchemaReconciler,
};
use tabmerge_io::{discover, Artifacts, FileIngestor, OutputWriter};
use tracing::info;

use crate::{logging, CliError, SourceArgs};

/// Logging flags collected from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogArgs {
    pub format: Option<LogFormat>,
    pub verbose: bool,
    pub quiet: bool,
}

/// Settings after command-line overrides.
struct RunConfig {
    input: PathBuf,
    output: PathBuf,
    settings: Settings,
}

fn resolve(
    source: SourceArgs,
    output: Option<PathBuf>,
    rows_per_part: Option<u64>,
    logs: LogArgs,
) -> Result<RunConfig, CliError> {
    let mut settings = Settings::load(source.config.as_deref())?;

    if let Some(input) = source.input {
        settings.input_dir = Some(input);
    }
    if let Some(output) = output {
        settings.output_dir = output;
    }
    if let Some(n) = rows_per_part {
        settings.rows_per_part = usize::try_from(n).unwrap_or(usize::MAX);
    }
    if let Some(delimiter) = source.delimiter {
        settings.csv_delimiter = delimiter;
    }
    if let Some(format) = logs.format {
        settings.log.format = format;
    }
    settings.validate()?;

    let input = settings.input_dir.clone().ok_or_else(|| {
        CliError::usage("no input directory given")
            .with_hint("pass INPUT, set TABMERGE_INPUT_DIR, or add input_dir to the settings file")
    })?;

    let directive = logging::filter_directive(&settings.log.level, logs.verbose, logs.quiet);
    logging::init(&directive, settings.log.format);

    Ok(RunConfig {
        input,
        output: settings.output_dir.clone(),
        settings,
    })
}

fn aggregate(config: &RunConfig, reconciler: SchemaReconciler) -> Result<AggregateOutput, CliError> {
    let files = discover(&config.input, Some(&config.output))?;
    info!(input = %config.input.display(), files = files.len(), "discovered input files");

    let ingestor = FileIngestor::new(config.settings.delimiter()?);
    Ok(Aggregator::new(reconciler, ingestor).aggregate(&files))
}

// ============================================================================
// merge
// ============================================================================

#[derive(Serialize)]
struct MergeReport<'a> {
    input_dir: &'a Path,
    output_dir: &'a Path,
    summary: &'a RunSummary,
    artifacts: Option<&'a Artifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    files: &'a [FileOutcome],
}

pub fn cmd_merge(
    source: SourceArgs,
    output: Option<PathBuf>,
    rows_per_part: Option<u64>,
    json: bool,
    logs: LogArgs,
) -> Result<(), CliError> {
    let config = resolve(source, output, rows_per_part, logs)?;
    let reconciler = SchemaReconciler::default();
    let expected_columns = reconciler.schema().len();

    let result = aggregate(&config, reconciler)?;
    let summary = result.summary();

    let writer = OutputWriter::new(&config.output, expected_columns)
        .with_rows_per_part(config.settings.rows_per_part);
    let written = writer.write(&result);

    // Summary first: it is printed even when writing failed
    eprint!("{}", render_summary(&summary, written.as_ref().ok()));

    if json {
        let report = MergeReport {
            input_dir: &config.input,
            output_dir: &config.output,
            summary: &summary,
            artifacts: written.as_ref().ok(),
            error: written.as_ref().err().map(|e| e.to_string()),
            files: &result.outcomes,
        };
        print_json(&report)?;
    }

    written.map(|_| ()).map_err(CliError::from)
}

/// Human-readable run summary.
pub fn render_summary(summary: &RunSummary, artifacts: Option<&Artifacts>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Files found:       {}", summary.files_seen);
    let _ = writeln!(
        out,
        "Combined:          {} ({} accepted by position)",
        summary.combined, summary.combined_positional
    );
    let _ = writeln!(out, "Mismatched:        {}", summary.mismatched);
    let _ = writeln!(out, "Failed:            {}", summary.failed);
    let _ = writeln!(out, "Skipped (empty):   {}", summary.skipped_empty);
    let _ = writeln!(out, "Total rows:        {}", summary.total_rows);

    if let Some(artifacts) = artifacts {
        for path in &artifacts.combined {
            let _ = writeln!(out, "Combined data:     {}", path.display());
        }
        if let Some(path) = &artifacts.mismatch_report {
            let _ = writeln!(out, "Mismatch report:   {}", path.display());
        }
        if let Some(path) = &artifacts.failure_report {
            let _ = writeln!(out, "Failure report:    {}", path.display());
        }
        if artifacts.combined.is_empty() {
            let _ = writeln!(out, "No data was combined.");
        }
    }
    out
}

// ============================================================================
// check
// ============================================================================

#[derive(Serialize)]
struct CheckReport<'a> {
    input_dir: &'a Path,
    summary: &'a RunSummary,
    files: &'a [FileOutcome],
    mismatches: &'a [MismatchRecord],
    failures: &'a [FailureRecord],
}

pub fn cmd_check(
    source: SourceArgs,
    output: Option<PathBuf>,
    json: bool,
    logs: LogArgs,
) -> Result<(), CliError> {
    let config = resolve(source, output, None, logs)?;
    let result = aggregate(&config, SchemaReconciler::default())?;
    let summary = result.summary();

    if json {
        let report = CheckReport {
            input_dir: &config.input,
            summary: &summary,
            files: &result.outcomes,
            mismatches: &result.mismatches,
            failures: &result.failures,
        };
        print_json(&report)?;
    } else {
        print!("{}", render_outcomes(&result));
    }

    eprint!("{}", render_summary(&summary, None));
    Ok(())
}

/// Per-file outcome table followed by mismatch and failure details.
pub fn render_outcomes(result: &AggregateOutput) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<20} {:>8}  FILE", "STATUS", "ROWS");
    for outcome in &result.outcomes {
        let rows = match outcome.status {
            FileStatus::Combined { rows, .. } => rows.to_string(),
            _ => "-".to_string(),
        };
        let _ = writeln!(out, "{:<20} {:>8}  {}", outcome.status.to_string(), rows, outcome.path.display());
    }

    for m in &result.mismatches {
        let _ = writeln!(
            out,
            "mismatch: {} ({} columns) missing [{}] extra [{}]",
            Path::new(&m.directory).join(&m.file).display(),
            m.found_count,
            tabmerge_io::output::render_list(&m.missing),
            tabmerge_io::output::render_list(&m.extra),
        );
    }
    for f in &result.failures {
        let _ = writeln!(
            out,
            "failed: {}: {}",
            Path::new(&f.directory).join(&f.file).display(),
            f.reason
        );
    }
    out
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("cannot serialize report: {e}")))?;
    println!("{}", text);
    Ok(())
}
