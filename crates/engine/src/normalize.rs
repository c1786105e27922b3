//! Canonical header tokens.
//!
//! Header text from different files is compared through its canonical token:
//! line breaks turned into spaces, everything except ASCII letters and digits
//! removed, then lowercased. `"ER SSN"`, `"er_ssn"` and `"Er\nSsn"` all become
//! `"erssn"`.

use crate::cell::CellValue;

/// Reduce header text to its canonical token. Never fails; may return `""`.
pub fn normalize(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalize a header cell, coercing non-text values first (`Empty` → `""`).
pub fn normalize_cell(cell: &CellValue) -> String {
    normalize(&cell.to_header_text())
}

/// Normalize every header in order.
pub fn normalize_all<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    headers.iter().map(|h| normalize(h.as_ref())).collect()
}
