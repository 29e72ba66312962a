use crate::domain::Listing;
use crate::exports::ExportError;
use rust_xlsxwriter::Workbook;
use std::path::Path;

pub fn write_xlsx(listings: &[Listing], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    // Headers
    let headers = [
        "Title",
        "Price",
        "Location",
        "Date",
        "Link",
        "Image",
        "Source",
    ];

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| {
                ExportError::Xlsx(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    // Rows
    for (i, listing) in listings.iter().enumerate() {
        let r = (i + 1) as u32;

        for (col, value) in listing.columns().iter().enumerate() {
            worksheet
                .write_string(r, col as u16, *value)
                .map_err(|e| {
                    ExportError::Xlsx(format!("Failed to write {}: {}", Listing::FIELDS[col], e))
                })?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| ExportError::Xlsx(format!("Failed to save workbook: {}", e)))
}
