//! `tabmerge-engine`: header reconciliation and aggregation.
//!
//! Pure engine crate: receives tables through [`TableSource`], returns the
//! combined dataset and the mismatch/failure buckets. No file-format or CLI
//! dependencies.

pub mod aggregate;
pub mod cell;
pub mod error;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod schema;

pub use aggregate::{Aggregator, TableSource};
pub use cell::CellValue;
pub use error::IngestError;
pub use model::{
    AggregateOutput, CombinedDataset, FailureRecord, FileOutcome, FileStatus, MismatchRecord,
    RunSummary, Table,
};
pub use normalize::normalize;
pub use reconcile::{Reconciliation, SchemaReconciler};
pub use schema::ReferenceSchema;
