// browser.rs
use crate::domain::RawRecord;
use crate::scraper::paged::{extract_listing_page, ITEM_CARD_RULES};
use crate::scraper::selectors::{dedupe_raw, parse_selectors};
use crate::scraper::strategy::{Limits, RunContext, SearchTarget};
use crate::scraper::ScraperError;
use std::time::Duration;

const READY_SELECTOR: &str = "a";
const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// A rendered page plus whether the readiness selector showed up in time.
#[derive(Debug, Clone)]
pub struct PageLoad {
    pub html: String,
    pub ready: bool,
}

/// A live automation session. Dropping it must release the browser.
pub trait BrowserSession {
    fn load(&mut self, url: &str, ready_selector: &str, wait: Duration)
        -> Result<PageLoad, ScraperError>;
}

pub trait BrowserLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, ScraperError>;
}

pub struct BrowserScrape {
    launcher: Box<dyn BrowserLauncher>,
    target: SearchTarget,
    ready_selector: String,
    ready_timeout: Duration,
}

impl BrowserScrape {
    pub fn new(launcher: Box<dyn BrowserLauncher>, target: SearchTarget) -> Self {
        Self {
            launcher,
            target,
            ready_selector: READY_SELECTOR.to_string(),
            ready_timeout: READY_TIMEOUT,
        }
    }

    pub fn run(
        &mut self,
        query: &str,
        limits: &Limits,
        ctx: &RunContext<'_>,
    ) -> Result<Vec<RawRecord>, ScraperError> {
        let rules = parse_selectors(ITEM_CARD_RULES)?;

        tracing::info!("starting browser session");
        // Session is dropped (browser closed) on every return path below.
        let mut session = self.launcher.launch()?;

        let mut all = Vec::new();

        for page in 1..=limits.max_pages {
            if ctx.cancel.is_cancelled() {
                tracing::warn!(page, "interrupted, closing browser");
                break;
            }

            let url = self.target.page_url(query, page);
            tracing::info!(page, url = %url, "loading page in browser");

            let load = session.load(&url, &self.ready_selector, self.ready_timeout)?;
            if !load.ready {
                tracing::warn!(page, selector = %self.ready_selector, "timed out waiting for page elements");
            }

            let records = extract_listing_page(&load.html, &rules, &self.target.base);
            if records.is_empty() {
                tracing::info!(page, "no listings found on page");
                if page == 1 {
                    ctx.dump_page("browser", &load.html);
                }
            } else {
                tracing::info!(page, count = records.len(), "page parsed");
                all.extend(records);
            }

            if page < limits.max_pages {
                ctx.pacing.pause_between_pages();
            }
        }

        Ok(dedupe_raw(all))
    }
}

#[cfg(feature = "browser")]
mod chrome {
    use super::*;
    use crate::scraper::client::USER_AGENT;
    use headless_chrome::{Browser, LaunchOptions, Tab};
    use std::ffi::OsStr;
    use std::sync::Arc;

    pub struct ChromeLauncher {
        headless: bool,
    }

    impl ChromeLauncher {
        pub fn new(headless: bool) -> Self {
            Self { headless }
        }
    }

    impl BrowserLauncher for ChromeLauncher {
        fn launch(&self) -> Result<Box<dyn BrowserSession>, ScraperError> {
            let args = vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
            ];

            let options = LaunchOptions::default_builder()
                .headless(self.headless)
                .sandbox(false)
                .args(args)
                .build()
                .map_err(|e| ScraperError::Browser(e.to_string()))?;

            let browser = Browser::new(options).map_err(|e| ScraperError::Browser(e.to_string()))?;
            let tab = browser
                .new_tab()
                .map_err(|e| ScraperError::Browser(e.to_string()))?;
            tab.set_user_agent(USER_AGENT, None, None)
                .map_err(|e| ScraperError::Browser(e.to_string()))?;

            Ok(Box::new(ChromeSession {
                tab,
                _browser: browser,
            }))
        }
    }

    // Field order matters: the tab goes before the browser process.
    struct ChromeSession {
        tab: Arc<Tab>,
        _browser: Browser,
    }

    impl BrowserSession for ChromeSession {
        fn load(
            &mut self,
            url: &str,
            ready_selector: &str,
            wait: Duration,
        ) -> Result<PageLoad, ScraperError> {
            self.tab
                .navigate_to(url)
                .map_err(|e| ScraperError::Browser(e.to_string()))?;

            if let Err(e) = self.tab.wait_until_navigated() {
                tracing::warn!(url, error = %e, "navigation did not settle");
            }

            let ready = self
                .tab
                .wait_for_element_with_custom_timeout(ready_selector, wait)
                .is_ok();

            let html = self
                .tab
                .get_content()
                .map_err(|e| ScraperError::Browser(e.to_string()))?;

            Ok(PageLoad { html, ready })
        }
    }
}

#[cfg(not(feature = "browser"))]
mod chrome {
    use super::*;

    pub struct ChromeLauncher;

    impl ChromeLauncher {
        pub fn new(_headless: bool) -> Self {
            Self
        }
    }

    impl BrowserLauncher for ChromeLauncher {
        fn launch(&self) -> Result<Box<dyn BrowserSession>, ScraperError> {
            Err(ScraperError::Config(
                "built without the `browser` feature".into(),
            ))
        }
    }
}

pub use chrome::ChromeLauncher;
