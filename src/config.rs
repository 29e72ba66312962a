// config.rs
use crate::scraper::{Limits, Pacing};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL {0:?}: {1}")]
    BaseUrl(String, url::ParseError),
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("min delay {min}ms is greater than max delay {max}ms")]
    DelayRange { min: u64, max: u64 },
    #[error("no strategies selected")]
    NoStrategies,
    #[error("output name must not be empty")]
    EmptyOutputName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Plain HTTP page fetch, optionally through rotating proxies
    Paged,
    /// Headless Chrome page loads
    Browser,
    /// Guessed JSON search endpoints
    Probe,
    Amazon,
    Flipkart,
}

/// Collect product listings from several sources into CSV and JSON.
#[derive(Debug, Parser)]
#[command(name = "listing_harvest", version)]
pub struct Cli {
    /// Search term
    #[arg(long, env = "HARVEST_QUERY", default_value = "car cover")]
    pub query: String,

    /// Strategies to run, in order
    #[arg(
        long,
        env = "HARVEST_STRATEGIES",
        value_enum,
        value_delimiter = ',',
        default_value = "browser,probe,amazon"
    )]
    pub strategies: Vec<StrategyKind>,

    /// Result pages per paged strategy
    #[arg(long, default_value_t = 2)]
    pub pages: u32,

    /// Proxy health-check attempts per request
    #[arg(long, default_value_t = 10)]
    pub attempts: u32,

    /// Retries per page request (paged strategy)
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Base URL of the classifieds site
    #[arg(long, env = "HARVEST_BASE_URL", default_value = "https://www.olx.in")]
    pub base_url: String,

    /// Proxies as host:port, comma separated
    #[arg(long = "proxy", env = "HARVEST_PROXIES", value_delimiter = ',')]
    pub proxies: Vec<String>,

    /// Health-check each proxy before using it
    #[arg(long)]
    pub check_proxies: bool,

    /// Per-request timeout for page fetches, seconds
    #[arg(long, default_value_t = 15)]
    pub timeout: u64,

    /// Per-request timeout for endpoint probes, seconds
    #[arg(long, default_value_t = 10)]
    pub probe_timeout: u64,

    /// Minimum pause between pages, milliseconds
    #[arg(long, default_value_t = 5_000)]
    pub min_delay_ms: u64,

    /// Maximum pause between pages, milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub max_delay_ms: u64,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Output file name without extension
    #[arg(long, short, default_value = "alternative_car_covers")]
    pub output: String,

    /// Directory for output files
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Also write an .xlsx workbook
    #[arg(long)]
    pub xlsx: bool,

    /// Save the HTML of empty first pages into this directory
    #[arg(long)]
    pub debug_dump: Option<PathBuf>,

    /// Exit with status 2 when nothing was found
    #[arg(long)]
    pub fail_on_empty: bool,
}

/// Validated run settings.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub query: String,
    pub strategies: Vec<StrategyKind>,
    pub limits: Limits,
    pub retries: u32,
    pub base_url: Url,
    pub proxies: Vec<String>,
    pub check_proxies: bool,
    pub page_timeout: Duration,
    pub probe_timeout: Duration,
    pub pacing: Pacing,
    pub headed: bool,
    pub out_dir: PathBuf,
    pub output_name: String,
    pub xlsx: bool,
    pub debug_dump: Option<PathBuf>,
    pub fail_on_empty: bool,
}

impl HarvestConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let base_url =
            Url::parse(&cli.base_url).map_err(|e| ConfigError::BaseUrl(cli.base_url.clone(), e))?;

        let config = Self {
            query: cli.query.trim().to_string(),
            strategies: cli.strategies,
            limits: Limits {
                max_pages: cli.pages,
                max_attempts: cli.attempts,
            },
            retries: cli.retries,
            base_url,
            proxies: cli.proxies,
            check_proxies: cli.check_proxies,
            page_timeout: Duration::from_secs(cli.timeout),
            probe_timeout: Duration::from_secs(cli.probe_timeout),
            pacing: Pacing {
                page_delay_ms: (cli.min_delay_ms, cli.max_delay_ms),
                backoff_step_ms: 2_000,
                backoff_max_ms: 10_000,
                jitter_ms: 2_000,
            },
            headed: cli.headed,
            out_dir: cli.out_dir,
            output_name: cli.output.trim().to_string(),
            xlsx: cli.xlsx,
            debug_dump: cli.debug_dump,
            fail_on_empty: cli.fail_on_empty,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategies.is_empty() {
            return Err(ConfigError::NoStrategies);
        }
        if self.limits.max_pages == 0 {
            return Err(ConfigError::Zero("pages"));
        }
        if self.limits.max_attempts == 0 {
            return Err(ConfigError::Zero("attempts"));
        }
        if self.retries == 0 {
            return Err(ConfigError::Zero("retries"));
        }
        let (min, max) = self.pacing.page_delay_ms;
        if min > max {
            return Err(ConfigError::DelayRange { min, max });
        }
        if self.output_name.is_empty() {
            return Err(ConfigError::EmptyOutputName);
        }
        Ok(())
    }

    pub fn csv_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.csv", self.output_name))
    }

    pub fn json_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.json", self.output_name))
    }

    pub fn xlsx_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.xlsx", self.output_name))
    }
}
