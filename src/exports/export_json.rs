use crate::domain::Listing;
use crate::exports::{write_atomically, ExportError};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shape of the JSON results file.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingsDocument {
    pub timestamp: String,
    pub total_listings: usize,
    pub listings: Vec<Listing>,
}

impl ListingsDocument {
    pub fn new(listings: &[Listing]) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            total_listings: listings.len(),
            listings: listings.to_vec(),
        }
    }
}

pub fn write_json(listings: &[Listing], path: &Path) -> Result<(), ExportError> {
    let doc = ListingsDocument::new(listings);
    // serde_json writes UTF-8 as-is; no \u escapes for non-ASCII.
    write_atomically(path, |file| Ok(serde_json::to_writer_pretty(file, &doc)?))
}
