pub mod dedupe;
pub mod listing;
pub mod normalize;

pub use dedupe::dedupe;
pub use listing::{Listing, RawRecord, SourceId};
pub use normalize::normalize_all;
