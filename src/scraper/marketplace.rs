// marketplace.rs
use crate::domain::RawRecord;
use crate::scraper::client::{fetch_ok, FetchRequest};
use crate::scraper::selectors::{absolutize, element_text, first_attr, first_text, parse_selector};
use crate::scraper::strategy::RunContext;
use crate::scraper::ScraperError;
use scraper::Html;
use std::time::Duration;
use url::Url;

/// Fixed markup rules for one retail site.
struct SiteRules {
    id: &'static str,
    base_url: &'static str,
    search_path: &'static str,
    query_param: &'static str,
    container: &'static str,
    title: &'static str,
    // Read from this attribute of `title` before falling back to its text.
    title_attr: Option<&'static str>,
    title_fallback: Option<&'static str>,
    price: &'static str,
    price_prefix: &'static str,
    link: &'static str,
    link_fallback: Option<&'static str>,
    image: &'static str,
    location: &'static str,
}

const AMAZON: SiteRules = SiteRules {
    id: "amazon",
    base_url: "https://www.amazon.in",
    search_path: "/s",
    query_param: "k",
    container: r#"div[data-component-type="s-search-result"]"#,
    title: "h2",
    title_attr: None,
    title_fallback: None,
    price: "span.a-price-whole",
    price_prefix: "₹",
    link: "h2 a[href]",
    link_fallback: Some("a.a-link-normal[href]"),
    image: "img.s-image",
    location: "Amazon India",
};

const FLIPKART: SiteRules = SiteRules {
    id: "flipkart",
    base_url: "https://www.flipkart.com",
    search_path: "/search",
    query_param: "q",
    container: "div[data-id]",
    title: "a[title]",
    title_attr: Some("title"),
    title_fallback: Some("div.KzDlHZ"),
    price: "div.Nx9bqj",
    price_prefix: "",
    link: "a[href]",
    link_fallback: None,
    image: "img",
    location: "Flipkart",
};

/// Listings on these sites are in stock rather than dated.
const AVAILABLE: &str = "Available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marketplace {
    Amazon,
    Flipkart,
}

impl Marketplace {
    fn rules(&self) -> &'static SiteRules {
        match self {
            Marketplace::Amazon => &AMAZON,
            Marketplace::Flipkart => &FLIPKART,
        }
    }

    pub fn id(&self) -> &'static str {
        self.rules().id
    }

    pub fn search_url(&self, query: &str) -> Result<Url, ScraperError> {
        let rules = self.rules();
        let endpoint = format!("{}{}", rules.base_url, rules.search_path);
        Url::parse_with_params(&endpoint, [(rules.query_param, query)])
            .map_err(|e| ScraperError::Config(e.to_string()))
    }

    /// Parses a search results page with this site's fixed rules.
    pub fn extract(&self, html: &str) -> Result<Vec<RawRecord>, ScraperError> {
        let rules = self.rules();
        let base = Url::parse(rules.base_url).map_err(|e| ScraperError::Config(e.to_string()))?;

        let container = parse_selector(rules.container)?;
        let title_sel = parse_selector(rules.title)?;
        let title_fallback = rules.title_fallback.map(parse_selector).transpose()?;
        let price_sel = parse_selector(rules.price)?;
        let link_sel = parse_selector(rules.link)?;
        let link_fallback = rules.link_fallback.map(parse_selector).transpose()?;
        let image_sel = parse_selector(rules.image)?;

        let document = Html::parse_document(html);
        let mut records = Vec::new();

        for product in document.select(&container) {
            let title = rules
                .title_attr
                .and_then(|attr| first_attr(&product, &title_sel, attr))
                .or_else(|| first_text(&product, &title_sel))
                .or_else(|| {
                    title_fallback
                        .as_ref()
                        .and_then(|sel| first_text(&product, sel))
                });

            let link = first_attr(&product, &link_sel, "href")
                .or_else(|| {
                    link_fallback
                        .as_ref()
                        .and_then(|sel| first_attr(&product, sel, "href"))
                })
                .and_then(|h| absolutize(&base, &h));

            let (Some(title), Some(link)) = (title, link) else {
                continue;
            };

            let mut record = RawRecord::new();
            record.insert("title".into(), title.replace('\n', " "));
            record.insert("link".into(), link);
            record.insert("location".into(), rules.location.into());
            record.insert("date".into(), AVAILABLE.into());

            if let Some(price) = product.select(&price_sel).next().map(|p| element_text(&p)) {
                let digits = price.trim_end_matches('.').trim();
                if !digits.is_empty() {
                    record.insert("price".into(), format!("{}{}", rules.price_prefix, digits));
                }
            }
            if let Some(src) = first_attr(&product, &image_sel, "src") {
                record.insert("image_url".into(), src);
            }

            records.push(record);
        }

        Ok(records)
    }
}

/// One request against a retail site's search page. No paging, no retry.
pub struct MarketplaceScrape {
    site: Marketplace,
    timeout: Duration,
}

impl MarketplaceScrape {
    pub fn new(site: Marketplace, timeout: Duration) -> Self {
        Self { site, timeout }
    }

    pub fn site(&self) -> Marketplace {
        self.site
    }

    pub fn run(&self, query: &str, ctx: &RunContext<'_>) -> Result<Vec<RawRecord>, ScraperError> {
        let url = self.site.search_url(query)?;
        tracing::info!(site = self.site.id(), url = %url, "searching marketplace");

        let req = FetchRequest::get(url.as_str(), self.timeout)
            .header("Accept-Language", "en-US,en;q=0.9");
        let html = fetch_ok(ctx.fetcher, &req)?;

        let records = self.site.extract(&html)?;
        tracing::info!(site = self.site.id(), count = records.len(), "marketplace listings found");

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::client::fakes::ScriptedFetcher;
    use crate::scraper::strategy::{CancelFlag, Pacing};
    use crate::tests::utils::{amazon_page, flipkart_page};

    #[test]
    fn search_urls() {
        assert_eq!(
            Marketplace::Amazon.search_url("car cover").unwrap().as_str(),
            "https://www.amazon.in/s?k=car+cover"
        );
        assert_eq!(
            Marketplace::Flipkart.search_url("car cover").unwrap().as_str(),
            "https://www.flipkart.com/search?q=car+cover"
        );
    }

    #[test]
    fn extracts_amazon_products() {
        let records = Marketplace::Amazon.extract(&amazon_page()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["title"], "Autofurnish Car Body Cover");
        assert_eq!(records[0]["price"], "₹1,299");
        assert_eq!(records[0]["link"], "https://www.amazon.in/dp/B01");
        assert_eq!(records[0]["image_url"], "https://m.media-amazon.com/1.jpg");
        assert_eq!(records[0]["location"], "Amazon India");
        assert_eq!(records[0]["date"], "Available");
        assert!(!records[1].contains_key("price"));
    }

    #[test]
    fn amazon_prefers_title_link_over_image_link() {
        let html = r#"<html><body>
            <div data-component-type="s-search-result">
              <a class="a-link-normal" href="/sspa/click?ad=1"><img class="s-image" src="https://m.media-amazon.com/2.jpg"></a>
              <h2><a href="/dp/B03"><span>Waterproof Car Cover</span></a></h2>
            </div>
            <div data-component-type="s-search-result">
              <h2><span>Universal Car Cover</span></h2>
              <a class="a-link-normal" href="/dp/B04">See options</a>
            </div>
        </body></html>"#;

        let records = Marketplace::Amazon.extract(html).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["link"], "https://www.amazon.in/dp/B03");
        assert_eq!(records[1]["link"], "https://www.amazon.in/dp/B04");
    }

    #[test]
    fn extracts_flipkart_products() {
        let records = Marketplace::Flipkart.extract(&flipkart_page()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["title"], "Fly Wings Car Cover");
        assert_eq!(records[0]["price"], "₹549");
        assert_eq!(records[0]["link"], "https://www.flipkart.com/p/itm1");
        assert_eq!(records[1]["title"], "Autoretail Body Cover");
    }

    #[test]
    fn run_fails_on_http_error() {
        let fetcher = ScriptedFetcher::new().respond("https://www.amazon.in", 503, "robot check");
        let ctx = RunContext {
            fetcher: &fetcher,
            cancel: CancelFlag::new(),
            pacing: Pacing::none(),
            debug_dump: None,
        };

        let err = MarketplaceScrape::new(Marketplace::Amazon, Duration::from_secs(1))
            .run("car cover", &ctx)
            .unwrap_err();

        assert!(matches!(err, ScraperError::Status { status: 503, .. }));
        assert_eq!(fetcher.urls().len(), 1);
    }
}
