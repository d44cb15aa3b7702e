//! Wikipedia summary lookup.
//!
//! Uses reqwest against the MediaWiki action API and scraper to pull
//! disambiguation candidates out of the page HTML.

use crate::config::WikiConfig;
use crate::summary::{SummaryResult, Topic, MAX_OPTIONS};
use rand::Rng;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// User-Agent string identifying this client, as Wikimedia asks of API users
const USER_AGENT: &str = concat!(
    "wikinotes/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/cladam/wikinotes)"
);

const BASE_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(8);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid API endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("API error {code}: {info}")]
    Api { code: String, info: String },
    #[error("unexpected API response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("API response has no '{0}' section")]
    MissingSection(&'static str),
}

/// Anything that can turn a topic into a summary result.
///
/// Lookups never fail outright: every failure is folded into the result.
pub trait SummaryProvider {
    fn lookup(&self, topic: &Topic) -> impl Future<Output = SummaryResult> + Send;
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    searchinfo: Option<SearchInfo>,
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchInfo {
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    #[serde(default)]
    disambiguation: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    text: String,
}

/// What the extract query says about a page
#[derive(Debug, PartialEq)]
enum PageOutcome {
    Summary(String),
    Missing,
    Disambiguation(String),
}

/// Client for the MediaWiki action API
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    client: Client,
    endpoint: Url,
    sentences: u32,
    retries: usize,
}

impl WikipediaClient {
    pub fn new(config: &WikiConfig) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&config.api_url)
            .map_err(|e| FetchError::InvalidEndpoint(format!("{}: {}", config.api_url, e)))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint,
            sentences: config.sentences,
            retries: config.retries,
        })
    }

    /// Look up a topic, surfacing failures as errors rather than results
    #[instrument(level = "info", skip_all, fields(topic = %topic), err)]
    pub async fn try_lookup(&self, topic: &Topic) -> Result<SummaryResult, FetchError> {
        let Some(title) = self.resolve_title(topic.as_str()).await? else {
            info!("no search hit or suggestion");
            return Ok(SummaryResult::not_found(topic.as_str()));
        };
        debug!(%title, "resolved title");

        match self.page_extract(&title).await? {
            PageOutcome::Summary(text) => Ok(SummaryResult::Found(text)),
            PageOutcome::Missing => Ok(SummaryResult::not_found(topic.as_str())),
            PageOutcome::Disambiguation(page_title) => {
                let html = self.page_html(&page_title).await?;
                let options = disambiguation_options(&html);
                info!(options = options.len(), "topic is ambiguous");
                Ok(SummaryResult::disambiguation(topic.as_str(), options))
            }
        }
    }

    /// Map a free-form topic to a page title via full-text search
    async fn resolve_title(&self, topic: &str) -> Result<Option<String>, FetchError> {
        let query: SearchQuery = self
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", topic),
                ("srlimit", "1"),
                ("srprop", ""),
                ("srinfo", "suggestion"),
            ])
            .await?;
        Ok(choose_title(query))
    }

    async fn page_extract(&self, title: &str) -> Result<PageOutcome, FetchError> {
        let sentences = self.sentences.to_string();
        let query: PageQuery = self
            .query(&[
                ("action", "query"),
                ("prop", "extracts|pageprops"),
                ("ppprop", "disambiguation"),
                ("explaintext", "1"),
                ("exsentences", sentences.as_str()),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        Ok(interpret_pages(query))
    }

    async fn page_html(&self, title: &str) -> Result<String, FetchError> {
        let mut body = self
            .request(&[
                ("action", "parse"),
                ("page", title),
                ("prop", "text"),
                ("redirects", "1"),
            ])
            .await?;
        let parsed = body
            .get_mut("parse")
            .map(Value::take)
            .ok_or(FetchError::MissingSection("parse"))?;
        let page: ParsedPage = serde_json::from_value(parsed)?;
        Ok(page.text)
    }

    /// Run an action=query request and decode its `query` section
    async fn query<T>(&self, params: &[(&str, &str)]) -> Result<T, FetchError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut body = self.request(params).await?;
        let query = body
            .get_mut("query")
            .map(Value::take)
            .ok_or(FetchError::MissingSection("query"))?;
        Ok(serde_json::from_value(query)?)
    }

    /// Send one API request, retrying connect and timeout failures with backoff
    async fn request(&self, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = self.build_url(params);
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.send(url.clone()).await {
                Ok(body) => {
                    check_api_error(&body)?;
                    return Ok(body);
                }
                Err(e) => {
                    attempt += 1;
                    let transient = e.is_timeout() || e.is_connect();
                    if !transient || attempt > self.retries {
                        error!(
                            attempt,
                            max = self.retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "request failed"
                        );
                        return Err(e.into());
                    }

                    let delay = retry_delay(attempt);
                    warn!(attempt, max = self.retries, ?delay, error = %e, "request failed; backing off");
                    sleep(delay).await;
                }
            }
        }
    }

    async fn send(&self, url: Url) -> Result<Value, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }

    fn build_url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(params.iter().copied())
            .append_pair("format", "json")
            .append_pair("formatversion", "2");
        url
    }
}

impl SummaryProvider for WikipediaClient {
    async fn lookup(&self, topic: &Topic) -> SummaryResult {
        self.try_lookup(topic)
            .await
            .unwrap_or_else(SummaryResult::failed)
    }
}

/// Exponential backoff capped at `MAX_RETRY_DELAY`, plus up to 250ms of jitter
fn retry_delay(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    let delay = BASE_RETRY_DELAY
        .saturating_mul(1 << shift)
        .min(MAX_RETRY_DELAY);
    let jitter_ms: u64 = rand::rng().random_range(0..=250);
    delay + Duration::from_millis(jitter_ms)
}

/// The API reports failures as `{"error": {"code", "info"}}` with HTTP 200
fn check_api_error(body: &Value) -> Result<(), FetchError> {
    match body.get("error") {
        Some(err) => {
            let field = |name: &str| {
                err.get(name)
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string()
            };
            Err(FetchError::Api {
                code: field("code"),
                info: field("info"),
            })
        }
        None => Ok(()),
    }
}

/// Prefer the top search hit, then the spelling suggestion.
// Note: the reverse of the usual auto-suggest order (`suggestion or results[0]`).
fn choose_title(query: SearchQuery) -> Option<String> {
    query
        .search
        .into_iter()
        .next()
        .map(|hit| hit.title)
        .or_else(|| query.searchinfo.and_then(|info| info.suggestion))
        .filter(|title| !title.trim().is_empty())
}

fn interpret_pages(query: PageQuery) -> PageOutcome {
    let Some(page) = query.pages.into_iter().next() else {
        return PageOutcome::Missing;
    };
    if page.missing || page.invalid {
        return PageOutcome::Missing;
    }
    if page
        .pageprops
        .as_ref()
        .is_some_and(|props| props.disambiguation.is_some())
    {
        return PageOutcome::Disambiguation(page.title);
    }
    PageOutcome::Summary(page.extract.unwrap_or_default())
}

/// Link text of the first link in each list item, skipping the table of contents
fn disambiguation_options(html: &str) -> Vec<String> {
    let document = Html::parse_fragment(html);
    let (Ok(item_selector), Ok(link_selector)) = (Selector::parse("li"), Selector::parse("a"))
    else {
        return Vec::new();
    };

    document
        .select(&item_selector)
        .filter(|item| {
            !item
                .value()
                .attr("class")
                .is_some_and(|class| class.contains("tocsection"))
        })
        .filter_map(|item| item.select(&link_selector).next())
        .map(|link| {
            let text: String = link.text().collect();
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|text| !text.is_empty())
        .take(MAX_OPTIONS)
        .collect()
}
