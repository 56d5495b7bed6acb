use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{Config, Secret};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Provider hits requested per sub-query.
const PAGE_SIZE: u8 = 2;
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search API rate limit exceeded")]
    RateLimited,

    #[error("search API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// One provider result for a single sub-query. `rank` is the provider's
/// return order within that sub-query only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub rank: usize,
}

/// Abstraction for the web-search provider.
/// Implemented by `CseClient` for production; mock implementations used in tests.
pub trait SearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

/// Client for a Programmable Search-style JSON endpoint.
#[derive(Clone)]
pub struct CseClient {
    http: Client,
    api_key: Secret,
    engine_id: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Item {
    link: Option<String>,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<u16>,
    message: Option<String>,
}

impl CseClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            api_key: config.search_api_key.clone(),
            engine_id: config.search_engine_id.clone(),
            base_url: config.search_base_url.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: Secret::new("test-key"),
            engine_id: "test-engine".to_string(),
            base_url: base_url.to_string(),
        }
    }

    async fn request(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let page_size = PAGE_SIZE.to_string();
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.expose()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", page_size.as_str()),
            ])
            .header("User-Agent", crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("search API rate limited");
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<SearchResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(err);
                warn!(error = %classified, "search API error");
                return Err(classified);
            }
            let snippet = if text.len() > 200 { &text[..200] } else { &text };
            warn!(status = %status, "search API error (no structured body)");
            return Err(SearchError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let body: SearchResponse = response.json().await?;
        if let Some(err) = &body.error {
            let classified = classify_api_error(err);
            warn!(error = %classified, "search API error in 200 response");
            return Err(classified);
        }

        let hits: Vec<SearchHit> = body
            .items
            .into_iter()
            .filter_map(|item| {
                let url = item.link.filter(|l| !l.is_empty())?;
                Some((url, item.title))
            })
            .enumerate()
            .map(|(rank, (url, title))| SearchHit { url, title, rank })
            .collect();

        debug!(query, hits = hits.len(), "search complete");
        Ok(hits)
    }
}

impl SearchClient for CseClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            match self.request(query).await {
                Ok(hits) => return Ok(hits),
                Err(e) if is_retriable(&e) => {
                    last_err = Some(e);
                    if attempt + 1 < MAX_RETRIES {
                        let delay_ms = jittered_backoff(attempt);
                        debug!(
                            attempt = attempt + 1,
                            delay_ms, "retrying after transient search error"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(SearchError::RateLimited))
    }
}

fn is_retriable(e: &SearchError) -> bool {
    matches!(
        e,
        SearchError::RateLimited
            | SearchError::Api {
                code: 500..=599,
                ..
            }
    )
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}

fn classify_api_error(err: &ApiError) -> SearchError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => SearchError::RateLimited,
        Some(code) => SearchError::Api { code, message },
        None => SearchError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}
