//! Header reconciliation against the reference schema.
//!
//! A file's header row is classified into one of three outcomes:
//!
//! 1. **Accepted**: the set of canonical tokens equals the reference set,
//!    regardless of order. Columns are picked by name.
//! 2. **AcceptedPositional**: the token set differs but the column count is
//!    exactly the reference width. Reference names are assigned by position
//!    and the original names are discarded. This is a deliberate tolerance
//!    policy; callers should report it as a warning.
//! 3. **Rejected**: neither rule applies.
//!
//! Positional acceptance outranks rejection whenever the counts agree, even if
//! none of the headers are recognizable.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::normalize::normalize_all;
use crate::schema::ReferenceSchema;

/// One reference column resolved to a source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedColumn {
    pub reference: String,
    pub original: String,
    pub source_index: usize,
}

/// Name-based mapping covering every reference column, in reference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub columns: Vec<MappedColumn>,
    /// Reference tokens matched by more than one source header. The last
    /// matching header (rightmost column) is the one used.
    pub duplicates: Vec<String>,
}

impl ColumnMapping {
    /// Source column index for each reference column, in reference order.
    pub fn source_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.iter().map(|c| c.source_index)
    }
}

/// Set differences between a file's tokens and the reference tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Reference tokens absent from the file, in reference order.
    pub missing: Vec<String>,
    /// File tokens not in the reference, in first-seen order.
    pub extra: Vec<String>,
    pub found_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reconciliation {
    Accepted(ColumnMapping),
    /// Width matches, names don't. The differences are kept for the warning.
    AcceptedPositional(Mismatch),
    Rejected(Mismatch),
}

impl Reconciliation {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Reconciliation::Rejected(_))
    }
}

/// Classifies header rows against a reference schema.
#[derive(Debug, Clone)]
pub struct SchemaReconciler {
    schema: ReferenceSchema,
}

impl SchemaReconciler {
    pub fn new(schema: ReferenceSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &ReferenceSchema {
        &self.schema
    }

    pub fn reconcile<S: AsRef<str>>(&self, headers: &[S]) -> Reconciliation {
        let normalized = normalize_all(headers);
        let found: HashSet<&str> = normalized.iter().map(String::as_str).collect();
        let reference: HashSet<&str> = self.schema.columns().iter().map(String::as_str).collect();

        if found == reference {
            return Reconciliation::Accepted(self.map_by_name(headers, &normalized));
        }

        let mismatch = self.mismatch(&normalized);
        if normalized.len() == self.schema.len() {
            Reconciliation::AcceptedPositional(mismatch)
        } else {
            Reconciliation::Rejected(mismatch)
        }
    }

    fn map_by_name<S: AsRef<str>>(&self, headers: &[S], normalized: &[String]) -> ColumnMapping {
        // Later columns overwrite earlier ones: last match wins.
        let mut by_token: HashMap<&str, usize> = HashMap::new();
        let mut hits: HashMap<&str, usize> = HashMap::new();
        for (idx, token) in normalized.iter().enumerate() {
            by_token.insert(token.as_str(), idx);
            *hits.entry(token.as_str()).or_default() += 1;
        }

        let mut columns = Vec::with_capacity(self.schema.len());
        let mut duplicates = Vec::new();
        for reference in self.schema.columns() {
            // Set equality guarantees every reference token is present.
            let Some(&source_index) = by_token.get(reference.as_str()) else {
                continue;
            };
            if hits.get(reference.as_str()).copied().unwrap_or(0) > 1 {
                duplicates.push(reference.clone());
            }
            columns.push(MappedColumn {
                reference: reference.clone(),
                original: headers[source_index].as_ref().to_string(),
                source_index,
            });
        }

        ColumnMapping { columns, duplicates }
    }

    fn mismatch(&self, normalized: &[String]) -> Mismatch {
        let found: HashSet<&str> = normalized.iter().map(String::as_str).collect();

        let missing = self
            .schema
            .columns()
            .iter()
            .filter(|c| !found.contains(c.as_str()))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let extra = normalized
            .iter()
            .filter(|t| !self.schema.contains(t) && seen.insert(t.as_str()))
            .cloned()
            .collect();

        Mismatch {
            missing,
            extra,
            found_count: normalized.len(),
        }
    }
}

impl Default for SchemaReconciler {
    fn default() -> Self {
        Self::new(ReferenceSchema::standard())
    }
}
