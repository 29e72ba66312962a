// src/domain/normalize.rs

use crate::domain::listing::{Listing, RawRecord, SourceId, NOT_AVAILABLE};

// Alternate key names per canonical field, highest priority first.
const TITLE_KEYS: &[&str] = &["title", "name"];
const PRICE_KEYS: &[&str] = &["price", "amount"];
const LOCATION_KEYS: &[&str] = &["location", "city"];
const DATE_KEYS: &[&str] = &["date", "created_at", "posted_at"];
const LINK_KEYS: &[&str] = &["link", "url"];
const IMAGE_KEYS: &[&str] = &["image_url", "image", "photo"];

/// Converts a raw scraped record into a `Listing`.
///
/// Returns `None` when the record has no usable title or link; those records
/// are dropped rather than carried forward with placeholder values. A link
/// equal to the "N/A" sentinel counts as missing.
pub fn normalize(raw: &RawRecord, source: &SourceId) -> Option<Listing> {
    let title = first_value(raw, TITLE_KEYS)?;
    let link = first_value(raw, LINK_KEYS).filter(|l| l != NOT_AVAILABLE)?;

    let source = first_value(raw, &["source"])
        .map(SourceId::new)
        .unwrap_or_else(|| source.clone());

    Some(Listing::from_parts(
        title,
        or_sentinel(first_value(raw, PRICE_KEYS)),
        or_sentinel(first_value(raw, LOCATION_KEYS)),
        or_sentinel(first_value(raw, DATE_KEYS)),
        link,
        or_sentinel(first_value(raw, IMAGE_KEYS)),
        source,
    ))
}

/// Normalizes a batch, silently discarding invalid records.
pub fn normalize_all(raws: &[RawRecord], source: &SourceId) -> Vec<Listing> {
    raws.iter().filter_map(|r| normalize(r, source)).collect()
}

fn first_value(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn or_sentinel(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
