// proxy.rs
use crate::scraper::client::{Fetcher, FetchRequest};
use std::time::Duration;

const HEALTH_CHECK_URL: &str = "http://httpbin.org/ip";
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Round-robin cursor over a fixed proxy list. Owned by whoever issues
/// requests; there is no shared rotation state.
#[derive(Debug, Clone, Default)]
pub struct ProxyRotation {
    proxies: Vec<String>,
    cursor: usize,
}

impl ProxyRotation {
    /// Accepts `host:port` or full proxy URLs; blank and malformed entries are skipped.
    pub fn new<I, S>(proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let proxies = proxies
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| p.contains(':'))
            .map(|p| {
                if p.contains("://") {
                    p
                } else {
                    format!("http://{p}")
                }
            })
            .collect();

        Self { proxies, cursor: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Next proxy URL, wrapping around. `None` means connect directly.
    pub fn next_proxy(&mut self) -> Option<String> {
        if self.proxies.is_empty() {
            return None;
        }
        let proxy = self.proxies[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.proxies.len();
        Some(proxy)
    }
}

/// Quick reachability probe through `proxy`.
pub fn check_proxy(fetcher: &dyn Fetcher, proxy: &str) -> bool {
    let req = FetchRequest::get(HEALTH_CHECK_URL, HEALTH_CHECK_TIMEOUT).proxy(Some(proxy.to_string()));
    match fetcher.fetch(&req) {
        Ok(resp) => resp.status == 200,
        Err(e) => {
            tracing::debug!(proxy, error = %e, "proxy health check failed");
            false
        }
    }
}
