// probe.rs
use crate::domain::RawRecord;
use crate::scraper::client::FetchRequest;
use crate::scraper::models::SearchPayload;
use crate::scraper::strategy::RunContext;
use crate::scraper::ScraperError;
use std::time::Duration;
use url::Url;

const MOBILE_USER_AGENT: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15";

const DEFAULT_LIMIT: u32 = 50;
const DEFAULT_CATEGORY: &str = "vehicles";

/// Tries guessed JSON search endpoints until one answers with a known shape.
pub struct EndpointProbe {
    endpoints: Vec<String>,
    location: String,
    limit: u32,
    timeout: Duration,
}

impl EndpointProbe {
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Self {
        Self {
            endpoints,
            location: String::new(),
            limit: DEFAULT_LIMIT,
            timeout,
        }
    }

    /// Candidate endpoints derived from the site's base URL. Same-host
    /// candidates keep the scheme and port; the mobile API host is only
    /// guessed for named hosts.
    pub fn for_site(base: &Url, timeout: Duration) -> Self {
        let same_host = |path: &str| base.join(path).ok().map(String::from);

        let mobile = base.domain().map(|domain| {
            let bare = domain.trim_start_matches("www.");
            let port = base.port().map(|p| format!(":{p}")).unwrap_or_default();
            format!("{}://mobile-api.{bare}{port}/v1/search", base.scheme())
        });

        let endpoints = [
            same_host("/api/relevance/v2/search"),
            same_host("/api/relevance/v3/search"),
            mobile,
            same_host("/ajax/search"),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::new(endpoints, timeout)
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn run(&self, query: &str, ctx: &RunContext<'_>) -> Result<Vec<RawRecord>, ScraperError> {
        tracing::info!(candidates = self.endpoints().len(), "searching for API endpoints");

        for endpoint in self.endpoints() {
            if ctx.cancel.is_cancelled() {
                return Err(ScraperError::Cancelled);
            }

            let limit = self.limit.to_string();
            let url = Url::parse_with_params(
                endpoint,
                [
                    ("q", query),
                    ("location", self.location.as_str()),
                    ("limit", limit.as_str()),
                    ("category", DEFAULT_CATEGORY),
                ],
            )
            .map_err(|e| ScraperError::Config(format!("bad endpoint {endpoint}: {e}")))?;

            let req = FetchRequest::get(url.as_str(), self.timeout)
                .header("User-Agent", MOBILE_USER_AGENT)
                .header("Accept", "application/json")
                .header("Accept-Language", "en-US,en;q=0.9");

            tracing::debug!(endpoint = %endpoint, "trying endpoint");

            let resp = match ctx.fetcher.fetch(&req) {
                Ok(resp) => resp,
                Err(e) => {
                    tracing::debug!(endpoint = %endpoint, error = %e, "endpoint unreachable");
                    continue;
                }
            };

            if resp.status != 200 {
                tracing::debug!(endpoint = %endpoint, status = resp.status, "endpoint rejected");
                continue;
            }

            match serde_json::from_str::<SearchPayload>(&resp.body) {
                Ok(payload) if payload.has_known_key() => {
                    tracing::info!(endpoint = %endpoint, "found working API endpoint");
                    return Ok(payload.into_records());
                }
                Ok(_) => tracing::debug!(endpoint = %endpoint, "payload has no known keys"),
                Err(e) => tracing::debug!(endpoint = %endpoint, error = %e, "not a JSON object"),
            }
        }

        tracing::info!("no working API endpoints found");
        Ok(Vec::new())
    }
}
