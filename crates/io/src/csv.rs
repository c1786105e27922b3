// CSV import

use std::io::Read;
use std::path::Path;

use tabmerge_engine::{CellValue, IngestError, Table};

/// Read a delimited-text file. The first record is the header row.
pub fn import(path: &Path, delimiter: u8) -> Result<Table, IngestError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, delimiter)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IngestError> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

pub fn import_from_string(content: &str, delimiter: u8) -> Result<Table, IngestError> {
    // A leading BOM would otherwise stick to the first header
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() {
        return Err(IngestError::NoColumns);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IngestError::Csv(e.to_string()))?;
        if record.len() > headers.len() {
            return Err(IngestError::RaggedRow {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: headers.len(),
                found: record.len(),
            });
        }

        // Short records are padded so every row spans the header
        let mut row: Vec<CellValue> = record.iter().map(CellValue::from_field).collect();
        row.resize(headers.len(), CellValue::Empty);
        rows.push(row);
    }

    let mut table = Table::new(headers, rows);
    table.drop_blank_rows();
    Ok(table)
}
