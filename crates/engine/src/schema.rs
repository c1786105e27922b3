use std::collections::HashSet;

use crate::normalize::normalize;

/// Columns every contribution file is expected to carry, in output order.
pub const STANDARD_COLUMNS: [&str; 16] = [
    "year",
    "month",
    "erssn",
    "ername",
    "eessn",
    "eename",
    "minc",
    "ss1eerate",
    "ss1errate",
    "ss1eeconamt",
    "ss1erconamt",
    "ss2eerate",
    "ss2errate",
    "ss2eeconamt",
    "ss2erconamt",
    "totalconamt",
];

/// Provenance columns appended after the reference columns.
pub const SOURCE_DIRECTORY_COLUMN: &str = "source_directory";
pub const SOURCE_FILENAME_COLUMN: &str = "source_filename";

/// Ordered set of canonical tokens a file's headers are reconciled against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSchema {
    columns: Vec<String>,
    tokens: HashSet<String>,
}

impl ReferenceSchema {
    /// Build a schema from column names. Names are normalized so comparisons
    /// against incoming headers are symmetric.
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        let mut seen = HashSet::new();
        let columns: Vec<String> = columns
            .iter()
            .map(|c| normalize(c.as_ref()))
            .filter(|c| seen.insert(c.clone()))
            .collect();
        let tokens = columns.iter().cloned().collect();
        Self { columns, tokens }
    }

    /// The fixed 16-column contribution schema.
    pub fn standard() -> Self {
        Self::new(&STANDARD_COLUMNS)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn token_set(&self) -> &HashSet<String> {
        &self.tokens
    }

    /// Header row of the combined dataset: reference columns then provenance.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.columns.clone();
        headers.push(SOURCE_DIRECTORY_COLUMN.to_string());
        headers.push(SOURCE_FILENAME_COLUMN.to_string());
        headers
    }
}

impl Default for ReferenceSchema {
    fn default() -> Self {
        Self::standard()
    }
}
