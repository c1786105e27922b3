//! Persisting the combined dataset and the two reports as XLSX files.

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::XlsxError;
use serde::Serialize;
use tabmerge_engine::{AggregateOutput, CellValue, CombinedDataset, FailureRecord, MismatchRecord};
use thiserror::Error;
use tracing::info;

use crate::xlsx::export_sheet;

pub const COMBINED_STEM: &str = "all_combined_data";
pub const MISMATCH_REPORT_FILE: &str = "mismatched_files_report.xlsx";
pub const FAILURE_REPORT_FILE: &str = "failed_files.xlsx";

/// Rows per combined file before the output is split into parts.
pub const DEFAULT_ROWS_PER_PART: usize = 500_000;

const COMBINED_SHEET: &str = "Sheet1";
const MISMATCH_SHEET: &str = "MismatchedFiles";
const FAILURE_SHEET: &str = "FailedFiles";

const MISMATCH_HEADERS: [&str; 7] = [
    "Sr. No.",
    "File Name",
    "Directory",
    "Expected Column Count",
    "Found Column Count",
    "Missing Standard Columns",
    "Extra Columns Found",
];

const FAILURE_HEADERS: [&str; 4] = ["Sr. No.", "File Name", "Directory", "Failure Reason"];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },
}

/// Paths of every artifact written by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Artifacts {
    pub combined: Vec<PathBuf>,
    pub mismatch_report: Option<PathBuf>,
    pub failure_report: Option<PathBuf>,
}

/// Writes the combined data (split into parts when large) and the reports.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    rows_per_part: usize,
    expected_columns: usize,
}

impl OutputWriter {
    /// `expected_columns` is the reference width shown in the mismatch report.
    pub fn new(output_dir: impl Into<PathBuf>, expected_columns: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            rows_per_part: DEFAULT_ROWS_PER_PART,
            expected_columns,
        }
    }

    pub fn with_rows_per_part(mut self, rows_per_part: usize) -> Self {
        self.rows_per_part = rows_per_part.max(1);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write every non-empty artifact. The first failing artifact aborts the
    /// run; artifacts written before it stay on disk.
    pub fn write(&self, output: &AggregateOutput) -> Result<Artifacts, OutputError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| OutputError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut artifacts = Artifacts::default();

        if !output.dataset.is_empty() {
            artifacts.combined = self.write_combined(&output.dataset)?;
        }
        if !output.mismatches.is_empty() {
            artifacts.mismatch_report = Some(self.write_mismatch_report(&output.mismatches)?);
        }
        if !output.failures.is_empty() {
            artifacts.failure_report = Some(self.write_failure_report(&output.failures)?);
        }

        Ok(artifacts)
    }

    pub fn write_combined(&self, dataset: &CombinedDataset) -> Result<Vec<PathBuf>, OutputError> {
        if dataset.len() <= self.rows_per_part {
            let path = self.output_dir.join(format!("{COMBINED_STEM}.xlsx"));
            save(&path, COMBINED_SHEET, dataset.headers(), dataset.rows().iter().map(Vec::as_slice))?;
            info!(path = %path.display(), rows = dataset.len(), "combined data saved as a single file");
            return Ok(vec![path]);
        }

        let parts = dataset.parts(self.rows_per_part);
        info!(rows = dataset.len(), parts = parts.len(), "splitting combined data");

        let mut paths = Vec::with_capacity(parts.len());
        for (idx, part) in parts.iter().enumerate() {
            let path = self.output_dir.join(format!("{COMBINED_STEM}_{}.xlsx", idx + 1));
            save(&path, COMBINED_SHEET, dataset.headers(), part.iter().map(Vec::as_slice))?;
            info!(path = %path.display(), part = idx + 1, rows = part.len(), "saved part");
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn write_mismatch_report(&self, mismatches: &[MismatchRecord]) -> Result<PathBuf, OutputError> {
        let rows: Vec<Vec<CellValue>> = mismatches
            .iter()
            .enumerate()
            .map(|(idx, m)| {
                vec![
                    CellValue::Number((idx + 1) as f64),
                    CellValue::from(m.file.as_str()),
                    CellValue::from(m.directory.as_str()),
                    CellValue::Number(self.expected_columns as f64),
                    CellValue::Number(m.found_count as f64),
                    CellValue::from(render_list(&m.missing)),
                    CellValue::from(render_list(&m.extra)),
                ]
            })
            .collect();

        let path = self.output_dir.join(MISMATCH_REPORT_FILE);
        save(&path, MISMATCH_SHEET, &headers(&MISMATCH_HEADERS), rows.iter().map(Vec::as_slice))?;
        Ok(path)
    }

    pub fn write_failure_report(&self, failures: &[FailureRecord]) -> Result<PathBuf, OutputError> {
        let rows: Vec<Vec<CellValue>> = failures
            .iter()
            .enumerate()
            .map(|(idx, f)| {
                vec![
                    CellValue::Number((idx + 1) as f64),
                    CellValue::from(f.file.as_str()),
                    CellValue::from(f.directory.as_str()),
                    CellValue::from(f.reason.as_str()),
                ]
            })
            .collect();

        let path = self.output_dir.join(FAILURE_REPORT_FILE);
        save(&path, FAILURE_SHEET, &headers(&FAILURE_HEADERS), rows.iter().map(Vec::as_slice))?;
        Ok(path)
    }
}

/// Shown in reports in place of a header that normalizes to nothing.
pub const BLANK_TOKEN_LABEL: &str = "(blank)";

/// Comma-separated rendering of a token list; empty list → empty string.
pub fn render_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| if item.is_empty() { BLANK_TOKEN_LABEL } else { item.as_str() })
        .collect::<Vec<_>>()
        .join(", ")
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn save<'a>(
    path: &Path,
    sheet: &str,
    headers: &[String],
    rows: impl IntoIterator<Item = &'a [CellValue]>,
) -> Result<(), OutputError> {
    export_sheet(path, sheet, headers, rows)
        .map(|_| ())
        .map_err(|source| OutputError::Write {
            path: path.to_path_buf(),
            source,
        })
}
