//! HTTP fetching with politeness delay and retries

use super::ScrapeError;
use crate::config::ScraperConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of HTML pages for the crawler
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the body of the page at `url`
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Fetches pages over HTTP, one at a time
///
/// Every successful request is followed by `request_delay` so the crawler
/// stays polite. A failed attempt waits `retry_backoff * attempt` before
/// the next one; the last error is returned once `max_retries` attempts fail.
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    request_delay: Duration,
    retry_backoff: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(ScrapeError::Client)?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            request_delay: config.request_delay,
            retry_backoff: config.retry_backoff,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ScrapeError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let mut last_err = None;

        for attempt in 1..=self.max_retries {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(url, attempt, bytes = body.len(), "Fetched page");
                    tokio::time::sleep(self.request_delay).await;
                    return Ok(body);
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "Fetch attempt failed");
                    last_err = Some(e);
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScrapeError::NoAttempts(url.to_string())))
    }
}
