// Excel import (single worksheet) and export (one sheet per file)
//
// Import: only the visible worksheet whose title normalizes to "sheet1" is
//         read; its first used row is the header row.
// Export: plain values with a bold header row. Files are written to a
//         temporary sibling and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, SheetType, SheetVisible};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet, XlsxError};
use tabmerge_engine::{normalize, CellValue, IngestError, Table};
use tracing::warn;

/// Canonical title of the worksheet that carries the data.
pub const DATA_SHEET_TOKEN: &str = "sheet1";

/// Excel's per-cell text limit, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Minimal view of a worksheet's metadata, enough to choose one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub name: String,
    pub visible: bool,
    /// False for chartsheets, dialog and macro sheets
    pub worksheet: bool,
}

/// First visible worksheet whose normalized title equals `sheet1`.
pub fn select_sheet(sheets: &[SheetInfo]) -> Option<&str> {
    sheets
        .iter()
        .filter(|s| s.visible && s.worksheet)
        .find(|s| normalize(&s.name) == DATA_SHEET_TOKEN)
        .map(|s| s.name.as_str())
}

/// Import the data worksheet of an Excel file.
pub fn import(path: &Path) -> Result<Table, IngestError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IngestError::Workbook(e.to_string()))?;

    let sheets: Vec<SheetInfo> = workbook
        .sheets_metadata()
        .iter()
        .map(|s| SheetInfo {
            name: s.name.clone(),
            visible: matches!(s.visible, SheetVisible::Visible),
            worksheet: matches!(s.typ, SheetType::WorkSheet),
        })
        .collect();

    let sheet_name = select_sheet(&sheets).ok_or(IngestError::NoVisibleSheet)?.to_string();

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::Sheet {
            sheet: sheet_name.clone(),
            message: e.to_string(),
        })?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first) => first.iter().map(|c| to_cell(c).to_header_text()).collect(),
        // Empty sheet: no header, no rows; the caller skips it
        None => return Ok(Table::default()),
    };

    let rows: Vec<Vec<CellValue>> = rows.map(|row| row.iter().map(to_cell).collect()).collect();

    let mut table = Table::new(headers, rows);
    table.drop_blank_rows();
    Ok(table)
}

/// Convert a calamine cell. Values are passed through; only representations
/// the engine has no variant for become text.
fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_field(s),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write one worksheet named `sheet_name` with a bold header row.
///
/// The workbook is saved next to `path` as `<name>.tmp` and renamed over
/// `path` only after a successful save.
pub fn export_sheet<'a, I>(
    path: &Path,
    sheet_name: &str,
    headers: &[String],
    rows: I,
) -> Result<usize, XlsxError>
where
    I: IntoIterator<Item = &'a [CellValue]>,
{
    let mut xlsx_workbook = XlsxWorkbook::new();
    let worksheet = xlsx_workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let header_format = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut written = 0usize;
    for (idx, row) in rows.into_iter().enumerate() {
        let row32 = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, row32, col as u16, cell, &date_format, &datetime_format)?;
        }
        written += 1;
    }

    save_atomically(&mut xlsx_workbook, path)?;
    Ok(written)
}

/// Save to `<name>.tmp` and rename over `path`. The temp file is removed on
/// any failure.
fn save_atomically(workbook: &mut XlsxWorkbook, path: &Path) -> Result<(), XlsxError> {
    let tmp_path = tmp_path_for(path);
    if let Err(e) = workbook.save(&tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        XlsxError::IoError(e)
    })
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    date_format: &Format,
    datetime_format: &Format,
) -> Result<(), XlsxError> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            worksheet.write_string(row, col, clamp_text(s, row, col))?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::DateTime(serial) => {
            let format = if serial.fract().abs() > 0.0001 { datetime_format } else { date_format };
            worksheet.write_number_with_format(row, col, *serial, format)?;
        }
    }
    Ok(())
}

/// Cut text to Excel's cell limit so one oversized value cannot fail the file.
fn clamp_text(text: &str, row: u32, col: u16) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            warn!(row, col, chars = text.chars().count(), "cell text exceeds Excel's limit, truncating");
            &text[..cut]
        }
        None => text,
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
