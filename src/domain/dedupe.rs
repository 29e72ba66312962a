// src/domain/dedupe.rs

use crate::domain::listing::Listing;
use std::collections::HashSet;

/// Drops listings whose link was already seen, keeping the first occurrence.
///
/// Links are compared as exact strings; callers wanting URL equivalence
/// (trailing slashes, query order, case) must canonicalize first.
pub fn dedupe(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|l| seen.insert(l.link().to_string()))
        .collect()
}
