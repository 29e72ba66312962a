pub mod browser;
pub mod client;
pub mod marketplace;
mod models;
pub mod paged;
pub mod probe;
pub mod proxy;
mod scraper_error;
mod selectors;
pub mod strategy;

pub use client::HttpFetcher;
pub use scraper_error::ScraperError;
pub use strategy::{CancelFlag, FetchOutcome, Limits, Pacing, RunContext, Strategy};
