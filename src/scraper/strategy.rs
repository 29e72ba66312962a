// strategy.rs
use crate::config::{HarvestConfig, StrategyKind};
use crate::domain::{RawRecord, SourceId};
use crate::scraper::browser::{BrowserScrape, ChromeLauncher};
use crate::scraper::client::Fetcher;
use crate::scraper::marketplace::{Marketplace, MarketplaceScrape};
use crate::scraper::paged::PagedFetch;
use crate::scraper::probe::EndpointProbe;
use crate::scraper::proxy::ProxyRotation;
use crate::scraper::ScraperError;
use rand::Rng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_pages: u32,
    pub max_attempts: u32,
}

/// Set from the Ctrl+C handler; checked between pages and strategies.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Randomized delays between network operations.
#[derive(Debug, Clone)]
pub struct Pacing {
    pub page_delay_ms: (u64, u64),
    pub backoff_step_ms: u64,
    pub backoff_max_ms: u64,
    pub jitter_ms: u64,
}

impl Pacing {
    /// No sleeping at all.
    pub fn none() -> Self {
        Self {
            page_delay_ms: (0, 0),
            backoff_step_ms: 0,
            backoff_max_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Random delay within `page_delay_ms`.
    pub fn page_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let (lo, hi) = self.page_delay_ms;
        Duration::from_millis(rng.gen_range(lo..=hi.max(lo)))
    }

    /// Linear backoff capped at `backoff_max_ms`, plus jitter.
    pub fn backoff_delay<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = std::cmp::min(
            self.backoff_step_ms.saturating_mul(attempt as u64),
            self.backoff_max_ms,
        );
        let jitter = rng.gen_range(0..=self.jitter_ms);
        Duration::from_millis(base + jitter)
    }

    pub fn pause_between_pages(&self) {
        let delay = self.page_delay(&mut rand::thread_rng());
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "pausing between pages");
            std::thread::sleep(delay);
        }
    }

    pub fn backoff(&self, attempt: u32) {
        let delay = self.backoff_delay(attempt, &mut rand::thread_rng());
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Everything a strategy borrows for one run.
pub struct RunContext<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub cancel: CancelFlag,
    pub pacing: Pacing,
    pub debug_dump: Option<PathBuf>,
}

impl RunContext<'_> {
    /// Saves a page that produced nothing, for later inspection.
    pub fn dump_page(&self, strategy: &str, html: &str) {
        let Some(dir) = &self.debug_dump else {
            return;
        };
        let path = dir.join(format!("{strategy}_debug.html"));
        match std::fs::write(&path, html) {
            Ok(()) => tracing::info!(path = %path.display(), "saved page source"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not save page source"),
        }
    }
}

/// Search pages on the primary classifieds site.
#[derive(Debug, Clone)]
pub struct SearchTarget {
    pub base: Url,
}

impl SearchTarget {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Page 1 is the bare search URL; later pages add `?page=N`.
    pub fn page_url(&self, query: &str, page: u32) -> String {
        let slug = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-");

        let mut url = self.base.clone();
        url.set_path(&format!("/items/q-{slug}"));
        if page > 1 {
            url.set_query(Some(&format!("page={page}")));
        }
        url.to_string()
    }
}

/// Result of one strategy run. Failures are values, never panics or `Err`.
#[derive(Debug)]
pub enum FetchOutcome {
    Records(Vec<RawRecord>),
    Empty,
    Failed(ScraperError),
}

impl FetchOutcome {
    pub fn from_result(result: Result<Vec<RawRecord>, ScraperError>) -> Self {
        match result {
            Ok(records) if records.is_empty() => FetchOutcome::Empty,
            Ok(records) => FetchOutcome::Records(records),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

pub enum Strategy {
    Paged(PagedFetch),
    Browser(BrowserScrape),
    Probe(EndpointProbe),
    Marketplace(MarketplaceScrape),
}

impl Strategy {
    pub fn from_kind(kind: StrategyKind, config: &HarvestConfig) -> Self {
        let target = SearchTarget::new(config.base_url.clone());
        match kind {
            StrategyKind::Paged => Strategy::Paged(PagedFetch::new(
                target,
                config.retries,
                config.page_timeout,
                ProxyRotation::new(&config.proxies),
                config.check_proxies,
            )),
            StrategyKind::Browser => Strategy::Browser(BrowserScrape::new(
                Box::new(ChromeLauncher::new(!config.headed)),
                target,
            )),
            StrategyKind::Probe => {
                Strategy::Probe(EndpointProbe::for_site(&config.base_url, config.probe_timeout))
            }
            StrategyKind::Amazon => Strategy::Marketplace(MarketplaceScrape::new(
                Marketplace::Amazon,
                config.page_timeout,
            )),
            StrategyKind::Flipkart => Strategy::Marketplace(MarketplaceScrape::new(
                Marketplace::Flipkart,
                config.page_timeout,
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Paged(_) => "paged-fetch",
            Strategy::Browser(_) => "browser",
            Strategy::Probe(_) => "endpoint-probe",
            Strategy::Marketplace(m) => m.site().id(),
        }
    }

    /// Source id stamped on listings this strategy produces.
    pub fn source(&self) -> SourceId {
        match self {
            Strategy::Marketplace(m) => SourceId::new(m.site().id()),
            _ => SourceId::default(),
        }
    }

    pub fn fetch(&mut self, query: &str, limits: &Limits, ctx: &RunContext<'_>) -> FetchOutcome {
        if ctx.cancel.is_cancelled() {
            return FetchOutcome::Failed(ScraperError::Cancelled);
        }

        let result = match self {
            Strategy::Paged(s) => s.run(query, limits, ctx),
            Strategy::Browser(s) => s.run(query, limits, ctx),
            Strategy::Probe(s) => s.run(query, ctx),
            Strategy::Marketplace(s) => s.run(query, ctx),
        };

        FetchOutcome::from_result(result)
    }
}
