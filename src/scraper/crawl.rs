//! Crawl orchestration: index page, month pages, decision pages

use super::cache::DecisionCache;
use super::fetch::PageFetcher;
use super::parse::{extract_decision_text, find_decision_links, find_month_links};
use super::{DecisionRecord, ScrapeError};
use crate::config::ScraperConfig;
use crate::util::jsonl;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters for one crawl
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub months: usize,
    pub decisions_seen: usize,
    pub fetched: usize,
    pub from_cache: usize,
    pub failed: usize,
    pub written: usize,
}

/// Walks the e-library and writes every decision to a JSONL file
pub struct Crawler<F: PageFetcher> {
    fetcher: F,
    config: ScraperConfig,
    cache: DecisionCache,
    show_progress: bool,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(fetcher: F, config: ScraperConfig, cache: DecisionCache) -> Self {
        Self {
            fetcher,
            config,
            cache,
            show_progress: false,
        }
    }

    /// Shows a per-month progress bar on stderr
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, len: usize, label: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{prefix:>10} [{bar:40}] {pos}/{len} {elapsed_precise}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix(label.to_string());
        bar
    }

    /// Crawls everything reachable from the index page and writes `output`.
    ///
    /// Cached decisions are reused without a request. A month or decision
    /// that cannot be fetched is logged and skipped; only a failure to read
    /// the index page or to write the output aborts the crawl.
    pub async fn run(&mut self, output: &Path) -> Result<CrawlSummary, ScrapeError> {
        let start = Instant::now();
        let base_url = self.config.base_url.clone();
        let index_url = format!("{}/", base_url.trim_end_matches('/'));

        let index_html = self.fetcher.fetch(&index_url).await?;
        let months = find_month_links(&index_html, &index_url)?;
        info!("Found {} month links", months.len());

        let mut summary = CrawlSummary {
            months: months.len(),
            ..Default::default()
        };
        let mut rows: Vec<DecisionRecord> = Vec::new();

        for month in &months {
            info!(month = %month.key(), url = %month.url, "Crawling month");

            let month_html = match self.fetcher.fetch(&month.url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(month = %month.key(), error = %e, "Skipping month");
                    continue;
                }
            };
            let mut decision_links = find_decision_links(&month_html, &month.url)?;
            if let Some(limit) = self.config.max_decisions_per_month {
                decision_links.truncate(limit);
            }
            debug!(month = %month.key(), candidates = decision_links.len(), "Decision links found");
            summary.decisions_seen += decision_links.len();

            let bar = self.progress_bar(decision_links.len(), &month.key());
            for url in &decision_links {
                bar.inc(1);

                match self.cache.load(url) {
                    Ok(Some(record)) => {
                        summary.from_cache += 1;
                        rows.push(record);
                        continue;
                    }
                    Ok(None) if self.cache.is_done(url) => {
                        debug!(url = %url, "Checkpointed decision has no cache entry, refetching");
                    }
                    Ok(None) => {}
                    Err(e) => warn!(url = %url, error = %e, "Ignoring unreadable cache entry"),
                }

                let html = match self.fetcher.fetch(url).await {
                    Ok(html) => html,
                    Err(e) => {
                        warn!(url = %url, error = %e, "Failed to fetch decision");
                        summary.failed += 1;
                        continue;
                    }
                };
                let (title, text) = extract_decision_text(&html);
                let record = DecisionRecord {
                    year: month.year.clone(),
                    month: month.month.clone(),
                    title,
                    url: url.clone(),
                    text,
                };

                if let Err(e) = self.cache.save(&record) {
                    warn!(url = %url, error = %e, "Failed to cache decision");
                }
                summary.fetched += 1;
                rows.push(record);
            }
            bar.finish_and_clear();
        }

        summary.written = write_jsonl(output, &rows)?;
        info!(
            written = summary.written,
            fetched = summary.fetched,
            from_cache = summary.from_cache,
            failed = summary.failed,
            elapsed_secs = start.elapsed().as_secs(),
            "Saved decisions to {}",
            output.display()
        );

        Ok(summary)
    }
}

fn write_jsonl(path: &Path, rows: &[DecisionRecord]) -> Result<usize, ScrapeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        jsonl::write_line(&mut writer, row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}
