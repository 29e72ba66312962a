// errors.rs
use crate::config::ConfigError;
use crate::exports::ExportError;
use crate::scraper::ScraperError;
use thiserror::Error;

/// Errors that end a harvest run. Everything below the orchestrator is
/// contained per strategy and never shows up here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Could not set up HTTP client: {0}")]
    Client(#[from] ScraperError),
    #[error("Could not write results: {0}")]
    Export(#[from] ExportError),
}
