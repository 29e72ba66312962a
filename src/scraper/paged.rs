// paged.rs
use crate::domain::RawRecord;
use crate::scraper::client::{fetch_ok, FetchRequest};
use crate::scraper::proxy::{check_proxy, ProxyRotation};
use crate::scraper::selectors::{dedupe_raw, extract_item_card, parse_selectors, select_with_fallback};
use crate::scraper::strategy::{Limits, RunContext, SearchTarget};
use crate::scraper::ScraperError;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Listing-card selectors for the classifieds site, most specific first.
pub const ITEM_CARD_RULES: &[&str] = &[
    r#"[data-aut-id="itemBox"]"#,
    ".EIR5N",
    r#"a[href*="/item/"]"#,
];

/// Parses one search results page with the fallback rules.
pub fn extract_listing_page(html: &str, rules: &[Selector], base: &Url) -> Vec<RawRecord> {
    let document = Html::parse_document(html);

    let Some((rule, cards)) = select_with_fallback(&document, rules) else {
        return Vec::new();
    };
    tracing::debug!(rule, cards = cards.len(), "matched listing cards");

    let records = cards
        .iter()
        .filter_map(|card| extract_item_card(card, base))
        .collect();

    dedupe_raw(records)
}

/// Plain HTTP page loop with bounded retries and optional proxy rotation.
pub struct PagedFetch {
    target: SearchTarget,
    retries: u32,
    timeout: Duration,
    rotation: ProxyRotation,
    check_proxies: bool,
}

impl PagedFetch {
    pub fn new(
        target: SearchTarget,
        retries: u32,
        timeout: Duration,
        rotation: ProxyRotation,
        check_proxies: bool,
    ) -> Self {
        Self {
            target,
            retries: retries.max(1),
            timeout,
            rotation,
            check_proxies,
        }
    }

    pub fn run(
        &mut self,
        query: &str,
        limits: &Limits,
        ctx: &RunContext<'_>,
    ) -> Result<Vec<RawRecord>, ScraperError> {
        let rules = parse_selectors(ITEM_CARD_RULES)?;
        let mut all = Vec::new();

        for page in 1..=limits.max_pages {
            if ctx.cancel.is_cancelled() {
                tracing::warn!(page, "interrupted, keeping pages fetched so far");
                break;
            }

            let url = self.target.page_url(query, page);
            tracing::info!(page, url = %url, "scraping page");

            let html = match self.fetch_with_retry(&url, limits, ctx) {
                Ok(html) => html,
                Err(ScraperError::Cancelled) => {
                    tracing::warn!(page, "interrupted during retries, keeping pages fetched so far");
                    break;
                }
                Err(e) => return Err(e),
            };
            let records = extract_listing_page(&html, &rules, &self.target.base);

            if records.is_empty() {
                tracing::info!(page, "no listings on page, stopping");
                if page == 1 {
                    ctx.dump_page("paged", &html);
                }
                break;
            }

            tracing::info!(page, count = records.len(), "page parsed");
            all.extend(records);

            if page < limits.max_pages {
                ctx.pacing.pause_between_pages();
            }
        }

        Ok(dedupe_raw(all))
    }

    fn fetch_with_retry(
        &mut self,
        url: &str,
        limits: &Limits,
        ctx: &RunContext<'_>,
    ) -> Result<String, ScraperError> {
        let mut last_err = None;

        for attempt in 1..=self.retries {
            if ctx.cancel.is_cancelled() {
                return Err(ScraperError::Cancelled);
            }

            let start = std::time::Instant::now();

            let result = self
                .pick_proxy(ctx, limits.max_attempts)
                .and_then(|proxy| {
                    let req = FetchRequest::get(url, self.timeout)
                        .header("Accept", "text/html,application/xhtml+xml")
                        .header("Accept-Language", "en-US,en;q=0.9")
                        .proxy(proxy);
                    fetch_ok(ctx.fetcher, &req)
                });

            match result {
                Ok(html) => {
                    tracing::debug!(attempt, elapsed = ?start.elapsed(), "fetch succeeded");
                    return Ok(html);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    tracing::warn!(attempt, elapsed = ?start.elapsed(), error = %e, "fetch attempt failed");
                    last_err = Some(e);
                    if attempt < self.retries {
                        ctx.pacing.backoff(attempt);
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScraperError::Network("retry loop failed".into())))
    }

    /// `Ok(None)` means go direct. With health checks on, tries up to
    /// `max_attempts` proxies before giving up on this request attempt.
    fn pick_proxy(
        &mut self,
        ctx: &RunContext<'_>,
        max_attempts: u32,
    ) -> Result<Option<String>, ScraperError> {
        if self.rotation.is_empty() {
            return Ok(None);
        }
        if !self.check_proxies {
            return Ok(self.rotation.next_proxy());
        }

        let tries = std::cmp::min(max_attempts as usize, self.rotation.len()).max(1);
        for _ in 0..tries {
            if let Some(proxy) = self.rotation.next_proxy() {
                if check_proxy(ctx.fetcher, &proxy) {
                    return Ok(Some(proxy));
                }
                tracing::warn!(proxy = %proxy, "proxy failed health check");
            }
        }

        Err(ScraperError::Network("no working proxy".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::client::fakes::ScriptedFetcher;
    use crate::scraper::client::{FetchResponse, Fetcher};
    use crate::scraper::strategy::{CancelFlag, Pacing};
    use crate::tests::utils::{olx_page, SITE};

    fn ctx(fetcher: &ScriptedFetcher) -> RunContext<'_> {
        RunContext {
            fetcher,
            cancel: CancelFlag::new(),
            pacing: Pacing::none(),
            debug_dump: None,
        }
    }

    fn paged(proxies: &[&str], check: bool) -> PagedFetch {
        PagedFetch::new(
            SearchTarget::new(Url::parse(SITE).unwrap()),
            3,
            Duration::from_secs(1),
            ProxyRotation::new(proxies),
            check,
        )
    }

    const LIMITS: Limits = Limits {
        max_pages: 5,
        max_attempts: 3,
    };

    #[test]
    fn stops_at_first_empty_page() {
        let page1 = format!("{SITE}/items/q-car-cover");
        let page2 = format!("{SITE}/items/q-car-cover?page=2");
        let fetcher = ScriptedFetcher::new()
            .respond(&page1, 200, &olx_page(&[("1", "Waterproof Car Cover"), ("2", "SUV Body Cover")]))
            .respond(&page2, 200, "<html><body><p>no results</p></body></html>");

        let records = paged(&[], false).run("car cover", &LIMITS, &ctx(&fetcher)).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(fetcher.urls(), vec![page1, page2]);
    }

    #[test]
    fn retries_transient_failures() {
        let page1 = format!("{SITE}/items/q-car-cover");
        let fetcher = ScriptedFetcher::new()
            .fail(&page1, "connection reset")
            .respond(&page1, 503, "busy")
            .respond(&page1, 200, &olx_page(&[("7", "Hatchback Car Cover")]));

        let limits = Limits {
            max_pages: 1,
            max_attempts: 1,
        };
        let records = paged(&[], false).run("car cover", &limits, &ctx(&fetcher)).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.urls().len(), 3);
    }

    #[test]
    fn exhausted_retries_fail_the_strategy() {
        let fetcher = ScriptedFetcher::new().fail(SITE, "timed out");

        let err = paged(&[], false)
            .run("car cover", &LIMITS, &ctx(&fetcher))
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(fetcher.urls().len(), 3);
    }

    #[test]
    fn rotates_proxies_per_attempt() {
        let page1 = format!("{SITE}/items/q-car-cover");
        let fetcher = ScriptedFetcher::new()
            .fail(&page1, "proxy refused")
            .respond(&page1, 200, "<html></html>");

        let limits = Limits {
            max_pages: 1,
            max_attempts: 1,
        };
        paged(&["10.0.0.1:80", "10.0.0.2:80"], false)
            .run("car cover", &limits, &ctx(&fetcher))
            .unwrap();

        let proxies: Vec<_> = fetcher
            .requests
            .borrow()
            .iter()
            .map(|r| r.proxy.clone())
            .collect();
        assert_eq!(
            proxies,
            vec![
                Some("http://10.0.0.1:80".to_string()),
                Some("http://10.0.0.2:80".to_string())
            ]
        );
    }

    #[test]
    fn cancelled_before_start_returns_nothing() {
        let fetcher = ScriptedFetcher::new();
        let context = ctx(&fetcher);
        context.cancel.cancel();

        let records = paged(&[], false).run("car cover", &LIMITS, &context).unwrap();
        assert!(records.is_empty());
        assert!(fetcher.urls().is_empty());
    }

    /// Raises the cancel flag as soon as a URL containing `trigger` is requested.
    struct CancelOn<'a> {
        inner: &'a ScriptedFetcher,
        trigger: &'static str,
        flag: CancelFlag,
    }

    impl Fetcher for CancelOn<'_> {
        fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse, ScraperError> {
            if req.url.contains(self.trigger) {
                self.flag.cancel();
            }
            self.inner.fetch(req)
        }
    }

    #[test]
    fn cancel_during_retries_keeps_earlier_pages() {
        let page1 = format!("{SITE}/items/q-car-cover");
        let page2 = format!("{SITE}/items/q-car-cover?page=2");
        let scripted = ScriptedFetcher::new()
            .respond(&page1, 200, &olx_page(&[("1", "Waterproof Car Cover")]))
            .fail(&page2, "connection reset");

        let cancel = CancelFlag::new();
        let fetcher = CancelOn {
            inner: &scripted,
            trigger: "page=2",
            flag: cancel.clone(),
        };
        let context = RunContext {
            fetcher: &fetcher,
            cancel,
            pacing: Pacing::none(),
            debug_dump: None,
        };

        let records = paged(&[], false).run("car cover", &LIMITS, &context).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["title"], "Waterproof Car Cover");
        // one attempt at page 2, then the flag stops the retry loop
        assert_eq!(scripted.urls(), vec![page1, page2]);
    }

    #[test]
    fn extract_page_falls_back_to_anchor_rule() {
        let html = r#"<html><body>
            <a href="/item/abc-1"><span>Premium Car Cover</span><span>₹899</span></a>
            <a href="/item/abc-1"><span>Premium Car Cover</span></a>
            <a href="/help">Help</a>
        </body></html>"#;
        let rules = parse_selectors(ITEM_CARD_RULES).unwrap();

        let records = extract_listing_page(html, &rules, &Url::parse(SITE).unwrap());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["price"], "₹899");
    }
}
