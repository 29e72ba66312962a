use crate::domain::Listing;
use crate::exports::{write_atomically, ExportError};
use std::io::Write;
use std::path::Path;

// Spreadsheet apps need the BOM to pick UTF-8 (₹ etc.).
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn write_csv(listings: &[Listing], path: &Path) -> Result<(), ExportError> {
    write_atomically(path, |file| {
        file.write_all(UTF8_BOM)
            .map_err(|e| ExportError::io(path, e))?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(Listing::FIELDS)?;
        for listing in listings {
            writer.write_record(listing.columns())?;
        }
        writer.flush().map_err(|e| ExportError::io(path, e))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::sample_listings;

    #[test]
    fn currency_symbol_survives_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        let listings = sample_listings();

        write_csv(&listings, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

        assert_eq!(rows.len(), listings.len());
        assert_eq!(&rows[0][1], "₹1,499");
        assert_eq!(&rows[0][0], listings[0].title());
        assert_eq!(&rows[1][4], listings[1].link());
        assert_eq!(&rows[1][3], "N/A");
    }

    #[test]
    fn header_uses_canonical_field_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");

        write_csv(&sample_listings(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.trim_start_matches('\u{feff}').lines().next().unwrap();
        assert_eq!(header, "title,price,location,date,link,image_url,source");
    }
}
