use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cell::CellValue;
use crate::schema::ReferenceSchema;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Header row plus data rows of one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    /// Remove rows in which every cell is blank. Returns how many were dropped.
    pub fn drop_blank_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !row.iter().all(CellValue::is_blank));
        before - self.rows.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Directory and file name of a source path, as written to reports and to
/// the provenance columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub file: String,
    pub directory: String,
}

impl SourceRef {
    pub fn from_path(path: &Path) -> Self {
        Self {
            file: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            directory: path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Combined dataset
// ---------------------------------------------------------------------------

/// Rows accepted from all files: reference columns in reference order plus
/// the two provenance columns. Append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedDataset {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl CombinedDataset {
    pub fn new(schema: &ReferenceSchema) -> Self {
        Self {
            headers: schema.output_headers(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of every row (reference columns + provenance).
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub(crate) fn push_row(&mut self, row: Vec<CellValue>) {
        debug_assert_eq!(row.len(), self.headers.len(), "combined row width");
        self.rows.push(row);
    }

    /// Contiguous slices of at most `rows_per_part` rows, in order.
    pub fn parts(&self, rows_per_part: usize) -> Vec<&[Vec<CellValue>]> {
        partition(self.rows.len(), rows_per_part)
            .into_iter()
            .map(|range| &self.rows[range])
            .collect()
    }
}

/// Split `total` rows into contiguous ranges of at most `rows_per_part`.
///
/// Yields `ceil(total / rows_per_part)` ranges; zero rows yield none.
pub fn partition(total: usize, rows_per_part: usize) -> Vec<Range<usize>> {
    let size = rows_per_part.max(1);
    (0..total)
        .step_by(size)
        .map(|start| start..(start + size).min(total))
        .collect()
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A file whose header set could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchRecord {
    pub file: String,
    pub directory: String,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    pub found_count: usize,
}

/// A file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub file: String,
    pub directory: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Per-file outcome + summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Rows were added; `positional` marks the tolerance branch.
    Combined { rows: usize, positional: bool },
    Mismatched,
    Failed,
    SkippedEmpty,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Combined { positional: false, .. } => write!(f, "combined"),
            Self::Combined { positional: true, .. } => write!(f, "combined_positional"),
            Self::Mismatched => write!(f, "mismatched"),
            Self::Failed => write!(f, "failed"),
            Self::SkippedEmpty => write!(f, "skipped_empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub files_seen: usize,
    pub combined: usize,
    pub combined_positional: usize,
    pub mismatched: usize,
    pub failed: usize,
    pub skipped_empty: usize,
    pub total_rows: usize,
}

/// Everything one aggregation pass produces.
#[derive(Debug, Clone)]
pub struct AggregateOutput {
    pub dataset: CombinedDataset,
    pub mismatches: Vec<MismatchRecord>,
    pub failures: Vec<FailureRecord>,
    pub outcomes: Vec<FileOutcome>,
}

impl AggregateOutput {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            files_seen: self.outcomes.len(),
            total_rows: self.dataset.len(),
            ..Default::default()
        };
        for outcome in &self.outcomes {
            match outcome.status {
                FileStatus::Combined { positional, .. } => {
                    summary.combined += 1;
                    if positional {
                        summary.combined_positional += 1;
                    }
                }
                FileStatus::Mismatched => summary.mismatched += 1,
                FileStatus::Failed => summary.failed += 1,
                FileStatus::SkippedEmpty => summary.skipped_empty += 1,
            }
        }
        summary
    }
}
