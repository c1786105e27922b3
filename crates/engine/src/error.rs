use thiserror::Error;

/// Reasons a single file could not be turned into a table.
///
/// The `Display` text is what lands in the failure report, so messages are
/// written for the person reading that report.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("no columns to parse from file")]
    NoColumns,

    #[error("CSV parse error: {0}")]
    Csv(String),

    #[error("line {line}: expected {expected} fields, found {found}")]
    RaggedRow { line: u64, expected: usize, found: usize },

    #[error("failed to open workbook: {0}")]
    Workbook(String),

    #[error("no visible sheet named 'sheet1' found")]
    NoVisibleSheet,

    #[error("failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },
}
