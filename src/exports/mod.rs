pub mod export_csv;
pub mod export_json;
pub mod export_xlsx;

use crate::domain::Listing;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

pub use export_csv::write_csv;
pub use export_json::write_json;
pub use export_xlsx::write_xlsx;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("XLSX error: {0}")]
    Xlsx(String),
}

impl ExportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing to persist; no files were touched.
    NothingToWrite,
    Written { files: Vec<PathBuf>, count: usize },
}

/// Writes the CSV and JSON result files. An empty slice writes nothing.
pub fn write_outputs(
    listings: &[Listing],
    csv_path: &Path,
    json_path: &Path,
) -> Result<WriteOutcome, ExportError> {
    if listings.is_empty() {
        return Ok(WriteOutcome::NothingToWrite);
    }

    write_csv(listings, csv_path)?;
    write_json(listings, json_path)?;

    tracing::info!(
        count = listings.len(),
        csv = %csv_path.display(),
        json = %json_path.display(),
        "results saved"
    );

    Ok(WriteOutcome::Written {
        files: vec![csv_path.to_path_buf(), json_path.to_path_buf()],
        count: listings.len(),
    })
}

/// The spreadsheet is an extra; a failure is logged and never undoes the
/// CSV and JSON files already saved.
pub fn write_extra_xlsx(listings: &[Listing], path: &Path) -> Option<PathBuf> {
    match write_xlsx(listings, path) {
        Ok(()) => Some(path.to_path_buf()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "xlsx export failed");
            None
        }
    }
}

/// Writes through a temp file in the target directory, then renames it into
/// place, so a failed write never leaves a truncated file behind.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), ExportError>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ExportError::io(path, e))?;
    write(&mut tmp)?;
    tmp.as_file_mut()
        .flush()
        .map_err(|e| ExportError::io(path, e))?;
    tmp.persist(path).map_err(|e| ExportError::io(path, e.error))?;

    Ok(())
}
