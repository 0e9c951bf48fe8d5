use std::thread;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use scraper::Html;

use crate::parser;

/// Search query carried in the results URL: APE codes, creation date
/// range, sort order and page size, pre-encoded by the site itself.
const SEARCH_QUERY: &str = "P2FwZUNvZGVzPTg3MTBBJTJDODcxMEIlMkM4NzEwQyUyQzg3MjBBJTJDODczMEIlMkM4NzkwQSUyQzg3OTBCJTJDODcyMEIlMkM4NzMwQSZzaXJlbnM9Jm1pbkNyZWF0aW9uRGF0ZT0yMDAwJm1heENyZWF0aW9uRGF0ZT0yMDI1JmluY2x1ZGVGb3JlaWduZXJzPTAmaXNBY3RpdmU9MSZzb3J0Qnk9c2FsZXMmc29ydE9yZGVyPWRlc2MmY3VzdG9tQ29sdW1uTmFtZT1zdGFmZiZsaW1pdD0yNQ==";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    BadResponse(String),
}

/// Supplies one search results page as a parsed document.
///
/// The scrape session depends only on this query capability; how pages
/// are fetched and rendered stays behind the trait.
pub trait PageSource {
    fn fetch_page(&self, page: u32) -> Result<Html, FetchError>;
}

/// Anti-bot knobs for the HTTP source. The scrape session never looks
/// inside these.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Fixed user agent; a random one is drawn when unset.
    pub user_agent: Option<String>,
    /// Proxy URLs to rotate through; direct connection when empty.
    pub proxies: Vec<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How long to keep polling for the results table before handing
    /// the page back as fetched.
    pub row_wait: Duration,
    /// Pause between readiness polls.
    pub poll_interval: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            user_agent: None,
            proxies: Vec::new(),
            timeout: Duration::from_secs(30),
            row_wait: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
        }
    }
}

pub fn random_user_agent() -> String {
    fake_user_agent::get_rua().to_string()
}

fn pick_proxy(proxies: &[String]) -> Option<&String> {
    proxies.choose(&mut rand::thread_rng())
}

/// Probes a proxy with a cheap request so dead entries can be dropped
/// from the rotation before a run.
pub fn proxy_is_working(proxy_url: &str) -> bool {
    let client = reqwest::Proxy::all(proxy_url)
        .and_then(|proxy| {
            Client::builder()
                .proxy(proxy)
                .timeout(Duration::from_secs(5))
                .build()
        });
    match client {
        Ok(client) => client.get("http://example.com").send().is_ok(),
        Err(_) => false,
    }
}

/// Plain HTTP page source with a bounded wait for the results table.
pub struct HttpSource {
    client: Client,
    base_url: String,
    row_wait: Duration,
    poll_interval: Duration,
}

impl HttpSource {
    /// Builds the underlying client once per run. The client is the
    /// only held network resource; dropping the source releases it on
    /// every exit path.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let user_agent = config.user_agent.unwrap_or_else(random_user_agent);
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent);
        if let Some(proxy_url) = pick_proxy(&config.proxies) {
            log::info!("Routing through proxy {}", proxy_url);
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(HttpSource {
            client: builder.build()?,
            base_url: crate::BASE_URL.to_string(),
            row_wait: config.row_wait,
            poll_interval: config.poll_interval,
        })
    }
}

impl PageSource for HttpSource {
    /// Fetches one page and waits, bounded, until the results table has
    /// rows. On timeout the page is returned as fetched; the caller
    /// then sees an empty page rather than an error.
    fn fetch_page(&self, page: u32) -> Result<Html, FetchError> {
        let url = format!(
            "{}/recherche-entreprises/{}/{}",
            self.base_url, page, SEARCH_QUERY
        );
        let deadline = Instant::now() + self.row_wait;

        loop {
            let response = self.client.get(&url).send()?;
            if !response.status().is_success() {
                return Err(FetchError::BadResponse(format!(
                    "status {} for {}",
                    response.status(),
                    url
                )));
            }

            let document = Html::parse_document(&response.text()?);
            if parser::has_company_rows(&document) || Instant::now() >= deadline {
                return Ok(document);
            }

            log::debug!("No rows on page {} yet, polling again", page);
            thread::sleep(self.poll_interval);
        }
    }
}
