use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cell::CellValue;
use crate::error::IngestError;
use crate::model::{
    AggregateOutput, CombinedDataset, FailureRecord, FileOutcome, FileStatus, MismatchRecord,
    SourceRef, Table,
};
use crate::reconcile::{Reconciliation, SchemaReconciler};

/// Produces a table for a path. Implemented by the file ingestor; tests use
/// in-memory sources.
pub trait TableSource {
    /// Read one file. Blank rows must already be removed.
    fn read_table(&self, path: &Path) -> Result<Table, IngestError>;
}

impl<T: TableSource + ?Sized> TableSource for &T {
    fn read_table(&self, path: &Path) -> Result<Table, IngestError> {
        (**self).read_table(path)
    }
}

/// Drives ingestion and reconciliation over a file list and accumulates the
/// combined dataset and the two report buckets.
pub struct Aggregator<S> {
    reconciler: SchemaReconciler,
    source: S,
}

impl<S: TableSource> Aggregator<S> {
    pub fn new(reconciler: SchemaReconciler, source: S) -> Self {
        Self { reconciler, source }
    }

    /// Process every path once, in byte-wise sorted order.
    pub fn aggregate(&self, paths: &[PathBuf]) -> AggregateOutput {
        let mut sorted: Vec<&PathBuf> = paths.iter().collect();
        sorted.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

        let mut output = AggregateOutput {
            dataset: CombinedDataset::new(self.reconciler.schema()),
            mismatches: Vec::new(),
            failures: Vec::new(),
            outcomes: Vec::with_capacity(sorted.len()),
        };

        for path in sorted {
            let status = self.process_file(path, &mut output);
            output.outcomes.push(FileOutcome {
                path: path.clone(),
                status,
            });
        }

        output
    }

    fn process_file(&self, path: &Path, output: &mut AggregateOutput) -> FileStatus {
        let source = SourceRef::from_path(path);

        let table = match self.source.read_table(path) {
            Ok(table) => table,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read file");
                output.failures.push(FailureRecord {
                    file: source.file,
                    directory: source.directory,
                    reason: e.to_string(),
                });
                return FileStatus::Failed;
            }
        };

        if table.is_empty() {
            info!(path = %path.display(), "file is empty after removing blank rows, skipping");
            return FileStatus::SkippedEmpty;
        }

        match self.reconciler.reconcile(&table.headers) {
            Reconciliation::Accepted(mapping) => {
                if !mapping.duplicates.is_empty() {
                    warn!(
                        path = %path.display(),
                        columns = ?mapping.duplicates,
                        "several headers map to the same column, using the rightmost"
                    );
                }
                let indices: Vec<usize> = mapping.source_indices().collect();
                let rows = append_rows(&mut output.dataset, &table, &indices, &source);
                debug!(path = %path.display(), rows, "combined");
                FileStatus::Combined { rows, positional: false }
            }
            Reconciliation::AcceptedPositional(mismatch) => {
                warn!(
                    path = %path.display(),
                    missing = ?mismatch.missing,
                    extra = ?mismatch.extra,
                    "headers don't match but column count is correct, renaming columns by position"
                );
                let indices: Vec<usize> = (0..self.reconciler.schema().len()).collect();
                let rows = append_rows(&mut output.dataset, &table, &indices, &source);
                FileStatus::Combined { rows, positional: true }
            }
            Reconciliation::Rejected(mismatch) => {
                warn!(
                    path = %path.display(),
                    found = mismatch.found_count,
                    expected = self.reconciler.schema().len(),
                    "column mismatch"
                );
                output.mismatches.push(MismatchRecord {
                    file: source.file,
                    directory: source.directory,
                    missing: mismatch.missing,
                    extra: mismatch.extra,
                    found_count: mismatch.found_count,
                });
                FileStatus::Mismatched
            }
        }
    }
}

/// Project every row onto `indices`, append provenance, push. Cells missing
/// from short rows become `Empty`.
fn append_rows(
    dataset: &mut CombinedDataset,
    table: &Table,
    indices: &[usize],
    source: &SourceRef,
) -> usize {
    for row in &table.rows {
        let mut out: Vec<CellValue> = Vec::with_capacity(indices.len() + 2);
        out.extend(indices.iter().map(|&i| row.get(i).cloned().unwrap_or_default()));
        out.push(CellValue::Text(source.directory.clone()));
        out.push(CellValue::Text(source.file.clone()));
        dataset.push_row(out);
    }
    table.rows.len()
}
