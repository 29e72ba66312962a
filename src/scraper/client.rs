// client.rs
use crate::scraper::ScraperError;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub proxy: Option<String>,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            proxy: None,
            timeout,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can turn a request into a status + body.
pub trait Fetcher {
    fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse, ScraperError>;
}

/// Blocking reqwest client. One client per proxy, built lazily.
pub struct HttpFetcher {
    direct: Client,
    proxied: RefCell<HashMap<String, Client>>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ScraperError> {
        Ok(Self {
            direct: build_client(None)?,
            proxied: RefCell::new(HashMap::new()),
        })
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<Client, ScraperError> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };

        let mut cache = self.proxied.borrow_mut();
        if let Some(client) = cache.get(proxy) {
            return Ok(client.clone());
        }

        let client = build_client(Some(proxy))?;
        cache.insert(proxy.to_string(), client.clone());
        Ok(client)
    }
}

fn build_client(proxy: Option<&str>) -> Result<Client, ScraperError> {
    let mut builder = Client::builder().user_agent(USER_AGENT);

    if let Some(p) = proxy {
        let proxy = reqwest::Proxy::all(p)
            .map_err(|e| ScraperError::Config(format!("bad proxy {p}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ScraperError::Network(e.to_string()))
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse, ScraperError> {
        let client = self.client_for(req.proxy.as_deref())?;

        let mut headers = HeaderMap::new();
        for (name, value) in &req.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ScraperError::Config(format!("bad header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ScraperError::Config(format!("bad header value: {e}")))?;
            headers.insert(name, value);
        }

        let resp = client
            .get(&req.url)
            .headers(headers)
            .timeout(req.timeout)
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        tracing::debug!(url = %req.url, status, bytes = body.len(), "fetched");

        Ok(FetchResponse { status, body })
    }
}

/// Fetches `req` and turns any non-2xx status into `ScraperError::Status`.
pub fn fetch_ok(fetcher: &dyn Fetcher, req: &FetchRequest) -> Result<String, ScraperError> {
    let resp = fetcher.fetch(req)?;
    if !resp.is_success() {
        return Err(ScraperError::Status {
            status: resp.status,
            url: req.url.clone(),
        });
    }
    Ok(resp.body)
}
