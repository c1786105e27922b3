// File I/O operations

pub mod csv;
pub mod discover;
pub mod ingest;
pub mod output;
pub mod xlsx;

pub use discover::{discover, DiscoverError};
pub use ingest::{FileIngestor, InputFormat};
pub use output::{Artifacts, OutputError, OutputWriter};
