// End-to-end tests: discovery → ingestion → aggregation → XLSX output.
// Run with: cargo test -p tabmerge-io --test pipeline

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;
use tabmerge_engine::{Aggregator, CellValue, IngestError, SchemaReconciler};
use tabmerge_io::output::{FAILURE_REPORT_FILE, MISMATCH_REPORT_FILE};
use tabmerge_io::{discover, FileIngestor, OutputWriter};
use tempfile::tempdir;

const DISPLAY_HEADERS: [&str; 16] = [
    "Year", "Month", "ER SSN", "ER Name", "EE SSN", "EE Name", "MINC",
    "SS1 EE Rate", "SS1 ER Rate", "SS1 EE Con Amt", "SS1 ER Con Amt",
    "SS2 EE Rate", "SS2 ER Rate", "SS2 EE Con Amt", "SS2 ER Con Amt",
    "Total Con Amt",
];

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// CSV whose header row lists `headers` and whose data cells are `r{row}c{col}`
/// labelled by the header's position, so reordering is observable.
fn write_csv(path: &Path, headers: &[&str], rows: usize) {
    let mut out = headers.join(",");
    out.push('\n');
    for r in 0..rows {
        let cells: Vec<String> = headers.iter().map(|h| format!("{}-{r}", tag(h))).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, out).unwrap();
}

/// Stable tag for a header: its canonical token.
fn tag(header: &str) -> String {
    tabmerge_engine::normalize(header)
}

/// Workbook with the given `(title, visible, headers)` sheets and one data row each.
fn write_xlsx(path: &Path, sheets: &[(&str, bool, &[&str])]) {
    let mut workbook = Workbook::new();
    let first_visible = sheets.iter().position(|(_, visible, _)| *visible);
    for (idx, (title, visible, headers)) in sheets.iter().enumerate() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*title).unwrap();
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
            worksheet.write_number(1, col as u16, (col + 1) as f64).unwrap();
        }
        if Some(idx) == first_visible {
            worksheet.set_active(true);
        }
        if !*visible {
            worksheet.set_hidden(true);
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    workbook.save(path).unwrap();
}

fn read_sheet(path: &Path, sheet: &str) -> Vec<Vec<Data>> {
    let mut workbook = open_workbook_auto(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range.rows().map(|r| r.to_vec()).collect()
}

fn as_text(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        Data::Float(n) => format!("{n}"),
        Data::Int(n) => format!("{n}"),
        Data::Empty => String::new(),
        other => format!("{other:?}"),
    }
}

/// Raw XML part of a saved workbook package.
fn package_part(path: &Path, part: &str) -> String {
    let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    let mut xml = String::new();
    archive.by_name(part).unwrap().read_to_string(&mut xml).unwrap();
    xml
}

fn run(input: &Path) -> tabmerge_engine::AggregateOutput {
    let files = discover(input, None).unwrap();
    Aggregator::new(SchemaReconciler::default(), FileIngestor::default()).aggregate(&files)
}

// ---------------------------------------------------------------------------
// Reconciliation scenarios
// ---------------------------------------------------------------------------

#[test]
fn reordered_csv_is_accepted_in_reference_order() {
    let dir = tempdir().unwrap();
    let mut headers = DISPLAY_HEADERS.to_vec();
    headers.rotate_left(5);
    let path = dir.path().join("2024/jan.csv");
    write_csv(&path, &headers, 3);

    let out = run(dir.path());
    assert_eq!(out.summary().combined, 1);
    assert_eq!(out.dataset.len(), 3);

    let first = &out.dataset.rows()[0];
    assert_eq!(first.len(), 18);
    assert_eq!(first[0], CellValue::from("year-0"));
    assert_eq!(first[2], CellValue::from("erssn-0"));
    assert_eq!(first[15], CellValue::from("totalconamt-0"));
    assert_eq!(first[16], CellValue::from(dir.path().join("2024").to_string_lossy().into_owned()));
    assert_eq!(first[17], CellValue::from("jan.csv"));
}

#[test]
fn fourteen_column_file_is_a_mismatch() {
    let dir = tempdir().unwrap();
    let headers: Vec<&str> = DISPLAY_HEADERS.iter().copied().filter(|h| *h != "MINC" && *h != "EE Name").collect();
    write_csv(&dir.path().join("short.csv"), &headers, 2);

    let out = run(dir.path());
    let summary = out.summary();
    assert_eq!(summary.mismatched, 1);
    assert_eq!(summary.combined, 0);
    assert!(out.dataset.is_empty());

    let m = &out.mismatches[0];
    assert_eq!(m.file, "short.csv");
    assert_eq!(m.found_count, 14);
    assert_eq!(m.missing, vec!["eename", "minc"]);
    assert!(m.extra.is_empty());
}

#[test]
fn sixteen_gibberish_headers_are_positional() {
    let dir = tempdir().unwrap();
    let headers: Vec<String> = (0..16).map(|i| format!("Column {i}")).collect();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    write_csv(&dir.path().join("garbage.csv"), &header_refs, 1);

    let out = run(dir.path());
    let summary = out.summary();
    assert_eq!(summary.combined, 1);
    assert_eq!(summary.combined_positional, 1);
    assert_eq!(out.dataset.rows()[0][0], CellValue::from("column0-0"));
    assert_eq!(out.dataset.rows()[0][15], CellValue::from("column15-0"));
}

#[test]
fn all_blank_file_is_skipped_everywhere() {
    let dir = tempdir().unwrap();
    let mut content = DISPLAY_HEADERS.join(",");
    content.push('\n');
    content.push_str(&",".repeat(15));
    content.push('\n');
    fs::write(dir.path().join("blank.csv"), content).unwrap();

    let out = run(dir.path());
    let summary = out.summary();
    assert_eq!(summary.skipped_empty, 1);
    assert_eq!(summary.combined + summary.mismatched + summary.failed, 0);
}

// ---------------------------------------------------------------------------
// Worksheet selection
// ---------------------------------------------------------------------------

#[test]
fn hidden_sheet1_and_visible_data_fails() {
    let dir = tempdir().unwrap();
    let gibberish: Vec<String> = (0..16).map(|i| format!("zz{i}")).collect();
    let gibberish: Vec<&str> = gibberish.iter().map(String::as_str).collect();
    let path = dir.path().join("hidden.xlsx");
    write_xlsx(&path, &[("Data", true, &gibberish[..]), ("Sheet1", false, &DISPLAY_HEADERS[..])]);

    let err = FileIngestor::default().ingest(&path).unwrap_err();
    assert!(matches!(err, IngestError::NoVisibleSheet));

    let out = run(dir.path());
    assert_eq!(out.summary().failed, 1);
    assert_eq!(out.failures[0].file, "hidden.xlsx");
    assert!(out.failures[0].reason.contains("no visible sheet named 'sheet1'"));
}

#[test]
fn visible_sheet_titled_sheet_1_is_read_even_beside_hidden_sheet1() {
    let dir = tempdir().unwrap();
    let gibberish: Vec<String> = (0..16).map(|i| format!("zz{i}")).collect();
    let gibberish: Vec<&str> = gibberish.iter().map(String::as_str).collect();
    let path = dir.path().join("renamed.xlsx");
    write_xlsx(&path, &[("Sheet 1", true, &gibberish[..]), ("Sheet1", false, &DISPLAY_HEADERS[..])]);

    let table = FileIngestor::default().ingest(&path).unwrap();
    assert_eq!(table.headers[0], "zz0");

    let out = run(dir.path());
    let summary = out.summary();
    assert_eq!(summary.combined, 1);
    assert_eq!(summary.combined_positional, 1);
    assert_eq!(out.dataset.rows()[0][0], CellValue::Number(1.0));
}

#[test]
fn corrupt_workbook_is_recorded_as_failure() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.xlsx"), b"PK\x03\x04garbage").unwrap();
    write_csv(&dir.path().join("good.csv"), &DISPLAY_HEADERS, 1);

    let out = run(dir.path());
    let summary = out.summary();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.combined, 1);
    assert_eq!(out.failures[0].file, "broken.xlsx");
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[test]
fn small_dataset_written_as_single_file() {
    let input = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    write_csv(&input.path().join("a.csv"), &DISPLAY_HEADERS, 2);

    let out = run(input.path());
    let artifacts = OutputWriter::new(output_dir.path(), 16).write(&out).unwrap();

    assert_eq!(artifacts.combined, vec![output_dir.path().join("all_combined_data.xlsx")]);
    assert!(artifacts.mismatch_report.is_none());
    assert!(artifacts.failure_report.is_none());

    let rows = read_sheet(&artifacts.combined[0], "Sheet1");
    assert_eq!(rows.len(), 3);
    assert_eq!(as_text(&rows[0][0]), "year");
    assert_eq!(as_text(&rows[0][16]), "source_directory");
    assert_eq!(as_text(&rows[0][17]), "source_filename");
    assert_eq!(as_text(&rows[2][0]), "year-1");
    assert_eq!(as_text(&rows[2][17]), "a.csv");
}

#[test]
fn large_dataset_is_split_into_ordered_parts() {
    let input = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    write_csv(&input.path().join("a.csv"), &DISPLAY_HEADERS, 3);
    write_csv(&input.path().join("b.csv"), &DISPLAY_HEADERS, 2);

    let out = run(input.path());
    assert_eq!(out.dataset.len(), 5);

    let artifacts = OutputWriter::new(output_dir.path(), 16)
        .with_rows_per_part(2)
        .write(&out)
        .unwrap();

    let expected: Vec<PathBuf> = (1..=3)
        .map(|n| output_dir.path().join(format!("all_combined_data_{n}.xlsx")))
        .collect();
    assert_eq!(artifacts.combined, expected);
    assert!(!output_dir.path().join("all_combined_data.xlsx").exists());

    let mut seen = Vec::new();
    for path in &artifacts.combined {
        let rows = read_sheet(path, "Sheet1");
        assert_eq!(as_text(&rows[0][0]), "year", "every part carries the header row");
        for row in &rows[1..] {
            seen.push(format!("{}:{}", as_text(&row[17]), as_text(&row[0])));
        }
    }
    assert_eq!(
        seen,
        vec!["a.csv:year-0", "a.csv:year-1", "a.csv:year-2", "b.csv:year-0", "b.csv:year-1"]
    );
}

#[test]
fn reports_list_mismatches_and_failures() {
    let input = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let mut wide = DISPLAY_HEADERS.to_vec();
    wide.push("Notes");
    write_csv(&input.path().join("wide.csv"), &wide, 1);
    fs::write(input.path().join("empty.csv"), "").unwrap();

    let out = run(input.path());
    let artifacts = OutputWriter::new(output_dir.path().join("nested"), 16).write(&out).unwrap();

    assert!(artifacts.combined.is_empty());
    let mismatch_path = artifacts.mismatch_report.unwrap();
    let failure_path = artifacts.failure_report.unwrap();
    assert_eq!(mismatch_path, output_dir.path().join("nested").join(MISMATCH_REPORT_FILE));
    assert_eq!(failure_path, output_dir.path().join("nested").join(FAILURE_REPORT_FILE));

    let rows = read_sheet(&mismatch_path, "MismatchedFiles");
    assert_eq!(as_text(&rows[0][0]), "Sr. No.");
    assert_eq!(as_text(&rows[0][6]), "Extra Columns Found");
    assert_eq!(as_text(&rows[1][0]), "1");
    assert_eq!(as_text(&rows[1][1]), "wide.csv");
    assert_eq!(as_text(&rows[1][3]), "16");
    assert_eq!(as_text(&rows[1][4]), "17");
    assert_eq!(as_text(&rows[1][5]), "");
    assert_eq!(as_text(&rows[1][6]), "notes");

    let rows = read_sheet(&failure_path, "FailedFiles");
    assert_eq!(as_text(&rows[0][3]), "Failure Reason");
    assert_eq!(as_text(&rows[1][1]), "empty.csv");
    assert_eq!(as_text(&rows[1][3]), "no columns to parse from file");
}

#[test]
fn rerun_over_same_input_is_identical() {
    let input = tempdir().unwrap();
    write_csv(&input.path().join("x/a.csv"), &DISPLAY_HEADERS, 2);
    write_csv(&input.path().join("y/b.csv"), &DISPLAY_HEADERS[..10], 1);

    let first = run(input.path());
    let second = run(input.path());
    assert_eq!(first.dataset, second.dataset);
    assert_eq!(first.mismatches, second.mismatches);
    assert_eq!(first.failures, second.failures);
}

#[test]
fn trailing_comma_header_is_reported_as_blank_extra() {
    let input = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let mut content = DISPLAY_HEADERS.join(",");
    content.push_str(",\n");
    content.push_str(&vec!["1"; 16].join(","));
    content.push_str(",\n");
    fs::write(input.path().join("trailing.csv"), content).unwrap();

    let out = run(input.path());
    assert_eq!(out.mismatches.len(), 1);
    assert_eq!(out.mismatches[0].found_count, 17);
    assert_eq!(out.mismatches[0].extra, vec![String::new()]);

    let artifacts = OutputWriter::new(output_dir.path(), 16).write(&out).unwrap();
    let rows = read_sheet(&artifacts.mismatch_report.unwrap(), "MismatchedFiles");
    assert_eq!(as_text(&rows[1][1]), "trailing.csv");
    assert_eq!(as_text(&rows[1][4]), "17");
    assert_eq!(as_text(&rows[1][6]), "(blank)");
}

#[test]
fn oversized_cell_does_not_block_combined_output() {
    let input = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let mut content = DISPLAY_HEADERS.join(",");
    content.push('\n');
    let mut cells = vec!["1".to_string(); 16];
    cells[3] = "x".repeat(40_000);
    content.push_str(&cells.join(","));
    content.push('\n');
    fs::write(input.path().join("long.csv"), content).unwrap();
    write_csv(&input.path().join("normal.csv"), &DISPLAY_HEADERS, 1);

    let out = run(input.path());
    assert_eq!(out.dataset.len(), 2);

    let artifacts = OutputWriter::new(output_dir.path(), 16).write(&out).unwrap();
    let rows = read_sheet(&artifacts.combined[0], "Sheet1");
    assert_eq!(rows.len(), 3);
    assert_eq!(as_text(&rows[1][3]).chars().count(), tabmerge_io::xlsx::MAX_CELL_CHARS);
    assert_eq!(as_text(&rows[2][17]), "normal.csv");
}

#[test]
fn header_rows_are_bold() {
    let input = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    write_csv(&input.path().join("a.csv"), &DISPLAY_HEADERS, 1);
    write_csv(&input.path().join("short.csv"), &DISPLAY_HEADERS[..14], 1);
    fs::write(input.path().join("empty.csv"), "").unwrap();

    let artifacts = OutputWriter::new(output_dir.path(), 16).write(&run(input.path())).unwrap();
    let files = [
        artifacts.combined[0].clone(),
        artifacts.mismatch_report.unwrap(),
        artifacts.failure_report.unwrap(),
    ];

    for path in &files {
        let styles = package_part(path, "xl/styles.xml");
        assert!(styles.contains("<b/>"), "no bold font in {}", path.display());

        // Header cells carry a style index; data cells in column A do not
        let sheet = package_part(path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<c r="A1" s="1""#), "header not styled in {}", path.display());
        assert!(!sheet.contains(r#"<c r="A2" s="#), "data row styled in {}", path.display());
    }
}
