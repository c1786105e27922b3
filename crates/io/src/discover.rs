use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use crate::ingest::InputFormat;

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("input directory does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("input path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// List every `.csv` / `.xlsx` file under `input_dir`, sorted.
///
/// `exclude` (typically the output directory) is skipped with everything
/// below it. Unreadable entries are logged and skipped.
pub fn discover(input_dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>, DiscoverError> {
    if !input_dir.exists() {
        return Err(DiscoverError::MissingInput(input_dir.to_path_buf()));
    }
    if !input_dir.is_dir() {
        return Err(DiscoverError::NotADirectory(input_dir.to_path_buf()));
    }

    // Excluding the input root itself would hide every file
    let root = input_dir.canonicalize().ok();
    let excluded = exclude
        .and_then(|p| p.canonicalize().ok())
        .filter(|p| Some(p) != root.as_ref());

    let mut files = Vec::new();
    let walker = WalkDir::new(input_dir).into_iter().filter_entry(|entry| {
        match (&excluded, entry.file_type().is_dir()) {
            (Some(skip), true) => entry.path().canonicalize().map(|p| &p != skip).unwrap_or(true),
            _ => true,
        }
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && InputFormat::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }

    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(files)
}
