//! Crawler for the Supreme Court e-library
//!
//! The e-library is organised as an index page listing every month since
//! 1996, month pages listing decisions, and one HTML page per decision.
//! [`Crawler`] walks that hierarchy and writes one [`DecisionRecord`] per
//! decision to a JSONL file. Fetched decisions are cached on disk so an
//! interrupted crawl resumes without refetching.

mod cache;
mod crawl;
mod fetch;
pub mod parse;

pub use cache::DecisionCache;
pub use crawl::{CrawlSummary, Crawler};
pub use fetch::{HttpFetcher, PageFetcher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One crawled decision, as stored in the JSONL files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(default)]
    pub year: String,
    /// Month abbreviation, e.g. `Jan`
    #[serde(default)]
    pub month: String,
    /// Contents of the page's `<title>`
    pub title: String,
    pub url: String,
    pub text: String,
}

/// Link from the index page to one month's decisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthLink {
    /// Four-digit year, or `unknown` when the page gave no hint
    pub year: String,
    pub month: String,
    pub url: String,
}

impl MonthLink {
    /// `"{year}-{month}"`, e.g. `1996-Jan`
    pub fn key(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }
}

/// Errors raised while crawling
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL {url}: {error}")]
    InvalidUrl { url: String, error: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("No attempts were made to fetch {0}")]
    NoAttempts(String),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache entry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
