use std::path::Path;

use tabmerge_engine::{IngestError, Table, TableSource};

/// Supported input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Xlsx,
}

impl InputFormat {
    /// Case-insensitive extension match; `None` for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Reads one input file into a table with blank rows removed.
#[derive(Debug, Clone)]
pub struct FileIngestor {
    delimiter: u8,
}

impl FileIngestor {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn ingest(&self, path: &Path) -> Result<Table, IngestError> {
        match InputFormat::from_path(path) {
            Some(InputFormat::Csv) => crate::csv::import(path, self.delimiter),
            Some(InputFormat::Xlsx) => crate::xlsx::import(path),
            None => Err(IngestError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl Default for FileIngestor {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl TableSource for FileIngestor {
    fn read_table(&self, path: &Path) -> Result<Table, IngestError> {
        self.ingest(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn format_from_extension_ignores_case() {
        assert_eq!(InputFormat::from_path(Path::new("a/b.CSV")), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_path(Path::new("b.Xlsx")), Some(InputFormat::Xlsx));
        assert_eq!(InputFormat::from_path(Path::new("b.xls")), None);
        assert_eq!(InputFormat::from_path(Path::new("xlsx")), None);
    }

    #[test]
    fn dispatches_csv_with_configured_delimiter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.CSV");
        fs::write(&path, "a;b\n1;2\n").unwrap();

        let table = FileIngestor::new(b';').ingest(&path).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = FileIngestor::default().ingest(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(_)));
    }
}
