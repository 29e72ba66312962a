// src/domain/listing.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Marker for a field the source did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Unnormalized key/value data as a strategy scraped it.
pub type RawRecord = HashMap<String, String>;

/// Identifies the strategy that produced a listing (e.g. "primary-site", "amazon").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub const PRIMARY: &'static str = "primary-site";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self(Self::PRIMARY.to_string())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical listing. Only the normalizer builds these; every field is
/// populated, absent values carry `NOT_AVAILABLE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    title: String,
    price: String,
    location: String,
    #[serde(rename = "date")]
    posted_at: String,
    link: String,
    image_url: String,
    #[serde(default)]
    source: SourceId,
}

impl Listing {
    /// Column order shared by every export format.
    pub const FIELDS: [&'static str; 7] = [
        "title",
        "price",
        "location",
        "date",
        "link",
        "image_url",
        "source",
    ];

    pub(super) fn from_parts(
        title: String,
        price: String,
        location: String,
        posted_at: String,
        link: String,
        image_url: String,
        source: SourceId,
    ) -> Self {
        Self {
            title,
            price,
            location,
            posted_at,
            link,
            image_url,
            source,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn posted_at(&self) -> &str {
        &self.posted_at
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Values in `FIELDS` order.
    pub fn columns(&self) -> [&str; 7] {
        [
            self.title(),
            self.price(),
            self.location(),
            self.posted_at(),
            self.link(),
            self.image_url(),
            self.source().as_str(),
        ]
    }
}
